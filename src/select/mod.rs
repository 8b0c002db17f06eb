//! Selection controls built on the query layer.
//!
//! - [`session`] - open/closed session state
//! - [`focus`] - keyboard focus movement over options
//! - [`lazy_select`] - the single-choice lazily paginated select
//! - [`assigner`] - multi-choice variant that keeps the list open

pub mod assigner;
pub mod focus;
pub mod lazy_select;
pub mod session;

pub use assigner::MultiAssigner;
pub use focus::Focus;
pub use lazy_select::LazySelect;
pub use session::SessionState;

/// An option the controls can list, focus and select.
pub trait SelectItem: Clone + Send + Sync + 'static {
    /// Stable identity used to match a selected value against loaded options
    fn key(&self) -> String;

    /// Text shown for the option
    fn label(&self) -> String;

    fn is_disabled(&self) -> bool {
        false
    }

    /// Headers and separators are listed but never focused or selected
    fn is_presentation(&self) -> bool {
        false
    }
}
