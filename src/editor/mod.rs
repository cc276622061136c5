// Editor module - async driver around the query state controller
//
// This module contains:
// - QueryEditor: dispatches commands into the controller and runs the fetches they trigger
// - EditorTasks: join handles for those fetches

pub mod controller;
pub mod tasks;

pub use controller::{QueryEditor, SearchOutcome};
pub use tasks::EditorTasks;
