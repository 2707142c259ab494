mod effective_focus;

pub use effective_focus::baseline_seconds;
