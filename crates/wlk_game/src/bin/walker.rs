use std::process::ExitCode;

use wlk_game::runner;
use wlk_game::walker::WalkerProgram;

fn main() -> ExitCode {
    runner::launch("assets/config/walker.json", WalkerProgram::new)
}
