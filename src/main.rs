use clonernews::app::RunOptions;
use clonernews::hackernews::Category;

const HELP: &str = "clonernews - a live Hacker News feed in the terminal.

  --demo               Browse bundled offline data
  --category <name>    Start on top, new, jobs, ask, show or polls
  --version, -V        Show version and exit
  --help,    -h        Show this help message";

fn main() {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => return,
        Err(message) => {
            eprintln!("error: {message}\n\n{HELP}");
            std::process::exit(2);
        }
    };

    if let Err(err) = clonernews::run(options) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

/// `Ok(None)` means an informational flag was handled and the process should exit.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<RunOptions>, String> {
    let mut options = RunOptions::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("clonernews {}", clonernews::VERSION);
                return Ok(None);
            }
            "--help" | "-h" => {
                println!("{HELP}");
                return Ok(None);
            }
            "--demo" => options.demo = true,
            "--category" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--category needs a value".to_string())?;
                let category = Category::from_key(&value)
                    .ok_or_else(|| format!("unknown category {value:?}"))?;
                options.category = Some(category);
            }
            other => return Err(format!("unknown argument {other:?}")),
        }
    }
    Ok(Some(options))
}
