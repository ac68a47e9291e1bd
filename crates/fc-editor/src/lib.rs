pub mod capture;
pub mod connect;
pub mod engine;
pub mod handles;
pub mod hit;
pub mod input;
pub mod tools;

pub use connect::{ConnectOutcome, ConnectState, ConnectTool};
pub use engine::{CanvasEngine, DropEffect, GraphMutation, HostEvent};
pub use input::{InputEvent, Modifiers};
pub use tools::{DragTool, Tool, ToolKind};
