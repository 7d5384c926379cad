pub mod calendar;

pub mod config;

pub mod picker;

pub mod signal;
