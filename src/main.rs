use resequencer::cli;
use resequencer::ui::output;

fn main() {
    let code = match cli::run() {
        Ok(code) => code,
        Err(err) => {
            output::error(format!("{err:#}"));
            1
        }
    };
    std::process::exit(code);
}
