use std::process;

use spinexec::{cli, run};

fn main() {
    let code = match cli::get_args() {
        Ok(args) => {
            run::init_logger(args.debug);
            run::run(&args.config)
        }
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    };

    process::exit(code);
}
