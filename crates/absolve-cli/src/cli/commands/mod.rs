use super::args::*;

pub mod ceiling;
pub mod execute;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Execute(args) => execute::run(args).await,
        Command::Ceiling(args) => ceiling::run(args),
    }
}
