use crate::program::{FrameContext, Program};

/// Empty program: the runner opens the window, clears it and paces frames.
#[derive(Debug, Default)]
pub struct TemplateProgram {
    frames: u64,
}

impl TemplateProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Program for TemplateProgram {
    fn name(&self) -> &str {
        "template"
    }

    fn update(&mut self, _frame: &FrameContext<'_>) {
        self.frames += 1;
    }
}
