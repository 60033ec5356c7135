pub type CmdResult<T> = scanflow::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod push;
pub mod run;

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        scanflow::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (scanflow::Result<serde_json::Value>, i32) {
    crate::tty::status("scanflow is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Push(args) => dispatch!(args, global, push),
    }
}
