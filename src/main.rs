use std::{env, fs::read_to_string, path::PathBuf, process::ExitCode, time::Instant};

use sema::{
    errors::errors::{Error, ErrorTip},
    get_line_at_position, parse_and_check,
    stdlib::standard_configuration,
    type_checker::diagnostics::render,
};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: sema <file>");
        return ExitCode::FAILURE;
    }

    let file_path = PathBuf::from(&args[1]);
    let file_name = file_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| args[1].clone());

    let source = match read_to_string(&file_path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Failed to read {}: {}", file_path.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let configuration = standard_configuration();

    let result = match parse_and_check(&source, &file_name, &configuration) {
        Ok(result) => result,
        Err(error) => {
            display_error(&error, &source, &file_name);
            return ExitCode::FAILURE;
        }
    };

    for diagnostic in &result.diagnostics {
        print!("{}", render(diagnostic, &source));
    }

    let errors = result.errors().count();
    println!(
        "Checked in {:?}: {} errors, {} warnings",
        start.elapsed(),
        errors,
        result.diagnostics.len() - errors
    );

    if errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn display_error(error: &Error, source: &str, file_name: &str) {
    /*
        Error: message
        -> final.lang
           |
        20 | let a = #;
           | --------^
    */

    let position = error.get_position();
    let (line, line_text, line_pos) = get_line_at_position(source, position.0);

    let line_str = line.to_string();
    let padding = line_str.len() + 2;

    if let ErrorTip::None = error.get_tip() {
        println!("Error: {}", error.get_error_name());
    } else {
        println!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }
    println!("-> {}", file_name);
    println!("{:>padding$}", "|");

    let removed_whitespace = line_text.len() - line_text.trim_start_matches(' ').len();
    println!("{} | {}", line_str, line_text.trim());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    println!("{:>padding$} {:->arrows$}", "|", "^");
}
