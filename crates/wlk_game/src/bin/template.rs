use std::process::ExitCode;

use wlk_game::runner;
use wlk_game::template::TemplateProgram;

fn main() -> ExitCode {
    runner::launch("assets/config/template.json", |_| Ok(TemplateProgram::new()))
}
