// UI module - Slint window wiring and event loop bridge
//
// This module contains:
// - EventLoopBridge: queues window updates from tokio tasks and background threads
// - GuiController: wires the window to FormController and RenderAdapter

pub mod bridge;
pub mod controller;

pub use bridge::EventLoopBridge;
pub use controller::GuiController;
