use std::{env, fs, process::ExitCode, time::Instant};

use calico::{Runner, StdInput, StdPrint};

fn main() -> ExitCode {
    let mut print_execution_time = false;
    let mut file: Option<String> = None;

    for arg in env::args().skip(1) {
        if arg == "--time" {
            print_execution_time = true;
            continue;
        }
        if file.is_some() {
            eprintln!("error: unexpected argument: {arg}");
            return ExitCode::FAILURE;
        }
        file = Some(arg);
    }
    let Some(file) = file else {
        eprintln!("error: expected a source file");
        return ExitCode::FAILURE;
    };

    let code = match read_file(&file) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let runner = match Runner::new(&code, &file) {
        Ok(runner) => runner,
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let result = runner.run(&mut StdPrint, &mut StdInput);
    let elapsed = start.elapsed();

    if let Err(diagnostic) = result {
        eprintln!("{diagnostic}");
        return ExitCode::FAILURE;
    }
    if print_execution_time {
        println!("TIME: {:.3}sec", elapsed.as_secs_f64());
    }
    ExitCode::SUCCESS
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("cannot read {file_path}: {err}"));
        }
    }
    fs::read_to_string(file_path).map_err(|err| format!("cannot read {file_path}: {err}"))
}
