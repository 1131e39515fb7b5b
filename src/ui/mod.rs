//! User interface rendering and input handling.
//!
//! - **transcript**: styled scrollback the story output is drawn into
//! - **input_field**: single-line editor for answers
//! - **layout**: screen regions and button hit testing
//! - **keymapper**: key and mouse events to UI actions
//! - **renderer**: crossterm frame drawing

pub mod input_field;
pub mod keymapper;
pub mod layout;
pub mod renderer;
pub mod transcript;

pub use input_field::InputField;
pub use keymapper::{KeyMapper, UiAction};
pub use layout::Layout;
pub use renderer::Renderer;
pub use transcript::Transcript;
