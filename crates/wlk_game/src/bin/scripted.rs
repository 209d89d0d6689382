use std::process::ExitCode;

use wlk_game::runner;
use wlk_game::topdown::TopDownProgram;

fn main() -> ExitCode {
    runner::launch("assets/config/topdown.json", TopDownProgram::new)
}
