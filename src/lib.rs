//! DrawingFun: a single-screen freehand drawing pad.
//!
//! [`canvas::DrawingCanvas`] turns touch samples into strokes on a bitmap;
//! [`app::DrawingApp`] is the egui shell that forwards toolbar and dialog
//! choices to it and exports drawings to a [`gallery::Gallery`].

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod gallery;
pub mod paint;
pub mod raster;
pub mod settings;
