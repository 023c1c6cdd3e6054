use codoscope::{
    config::Config,
    diagnostics,
    logging::{self, Verbosity},
    provenance::{HoverOutcome, PipelineReport},
    session::{Session, SAMPLE_PROGRAM},
};
use std::{
    env, fs,
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
    process,
};

const USAGE: &str =
    "Usage: codoscope [-v|-q] [--config PATH] [--stages LIST] [--dump] [FILE | -c CODE]";

const HELP: &str = "\
commands:
  show [panel]         print every panel, or one by name or number
  hover <panel> <row>  hover a display row of a panel
  line <n>             hover source line n
  reload               re-read the input file
  stages               list the panels
  help                 show this text
  quit                 leave";

#[derive(Debug, PartialEq)]
enum Input {
    Sample,
    File(PathBuf),
    Inline(String),
}

#[derive(Debug, PartialEq)]
struct Options {
    verbose: bool,
    quiet: bool,
    config: Option<PathBuf>,
    stages: Option<String>,
    dump: bool,
    input: Input,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        verbose: false,
        quiet: false,
        config: None,
        stages: None,
        dump: false,
        input: Input::Sample,
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => options.verbose = true,
            "-q" | "--quiet" => options.quiet = true,
            "--dump" => options.dump = true,
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                options.config = Some(PathBuf::from(path));
            }
            "--stages" => {
                options.stages = Some(args.next().ok_or("--stages needs a list")?);
            }
            "-c" => {
                let code = args.next().ok_or("-c needs program text")?;
                set_input(&mut options, Input::Inline(code))?;
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option `{flag}`")),
            file => set_input(&mut options, Input::File(PathBuf::from(file)))?,
        }
    }
    Ok(options)
}

fn set_input(options: &mut Options, input: Input) -> Result<(), String> {
    if options.input != Input::Sample {
        return Err("give either a FILE or -c CODE, not both".to_string());
    }
    options.input = input;
    Ok(())
}

fn read_input(input: &Input) -> Option<(String, String)> {
    match input {
        Input::Sample => Some(("<sample>".to_string(), SAMPLE_PROGRAM.to_string())),
        Input::Inline(code) => Some(("<inline>".to_string(), code.clone())),
        Input::File(path) => match fs::read_to_string(path) {
            Ok(text) => Some((path.display().to_string(), text)),
            Err(error) => {
                diagnostics::report_io_error(path, &error);
                None
            }
        },
    }
}

fn main() {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = match Config::discover(options.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(error) => {
            diagnostics::report_config_error(error);
            process::exit(1);
        }
    };
    logging::init_subscriber(
        Verbosity::from_flags(options.verbose, options.quiet),
        config.log_level.as_deref(),
    );
    if let Some(list) = &options.stages {
        if let Err(error) = config.override_stages(list) {
            diagnostics::report_config_error(error);
            process::exit(2);
        }
    }

    let Some((name, source)) = read_input(&options.input) else {
        process::exit(1);
    };
    let mut session = Session::new(&config);
    let report = session.set_source(name, source);
    let failed = report_failures(&session, &report);

    if options.dump {
        if let Err(error) = write_dump(&mut io::stdout().lock(), &session) {
            eprintln!("Failed to write output: {error}");
            process::exit(1);
        }
        process::exit(if failed { 1 } else { 0 });
    }

    if let Err(error) = interact(&mut session, &options.input) {
        eprintln!("Failed to read command: {error}");
        process::exit(1);
    }
}

fn write_dump(out: &mut impl Write, session: &Session) -> io::Result<()> {
    out.write_all(session.render_all().as_bytes())?;
    out.flush()
}

fn report_failures(session: &Session, report: &PipelineReport) -> bool {
    diagnostics::emit_pipeline_failures(session.source_name(), session.source(), report)
}

fn interact(session: &mut Session, input: &Input) -> io::Result<()> {
    let stdin = io::stdin();
    let prompt = stdin.is_terminal();
    if prompt {
        print!("{}", session.render_all());
        println!("type `help` for commands");
    }

    let mut lines = stdin.lock().lines();
    loop {
        if prompt {
            print!("codoscope> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => break,
            ["help"] => println!("{HELP}"),
            ["stages"] => {
                for (position, name) in session.stage_names().iter().enumerate() {
                    println!("{position:>3} {name}");
                }
            }
            ["show"] => print!("{}", session.render_all()),
            ["show", panel] => match session.find_panel(panel) {
                Some(id) => {
                    if let Some(rendered) = session.render(id) {
                        print!("{rendered}");
                    }
                }
                None => println!("unknown panel `{panel}`"),
            },
            ["hover", panel, row] => {
                let Some(id) = session.find_panel(panel) else {
                    println!("unknown panel `{panel}`");
                    continue;
                };
                let Ok(row) = row.parse::<usize>() else {
                    println!("row must be a number");
                    continue;
                };
                match session.hover(id, row) {
                    HoverOutcome::Broadcast(report) => println!(
                        "line {}: {} panel(s) updated, {} skipped",
                        report.line,
                        report.updated.len(),
                        report.skipped.len()
                    ),
                    HoverOutcome::NoSourceLine => println!("row {row} has no source line"),
                    HoverOutcome::UnknownPanel => println!("unknown panel `{panel}`"),
                }
            }
            ["line", line] => match line.parse() {
                Ok(line) => {
                    let report = session.hover_line(line);
                    println!(
                        "line {}: {} panel(s) updated, {} skipped",
                        report.line,
                        report.updated.len(),
                        report.skipped.len()
                    );
                }
                Err(_) => println!("line must be a number"),
            },
            ["reload"] => match input {
                Input::File(_) => {
                    if let Some((name, source)) = read_input(input) {
                        let report = session.set_source(name, source);
                        if !report_failures(session, &report) {
                            println!("reloaded (generation {})", report.generation);
                        }
                    }
                }
                _ => println!("nothing to reload"),
            },
            _ => println!("unknown command `{line}`, type `help`"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn defaults_to_sample() {
        let options = parse_args(args(&[])).expect("options");
        assert_eq!(options.input, Input::Sample);
        assert!(!options.dump);
    }

    #[test]
    fn reads_flags_and_file() {
        let options = parse_args(args(&[
            "-v",
            "--stages",
            "source,bytecode",
            "--dump",
            "prog.cds",
        ]))
        .expect("options");
        assert!(options.verbose);
        assert!(options.dump);
        assert_eq!(options.stages.as_deref(), Some("source,bytecode"));
        assert_eq!(options.input, Input::File(PathBuf::from("prog.cds")));
    }

    #[test]
    fn file_and_inline_code_conflict() {
        assert!(parse_args(args(&["prog.cds", "-c", "out(1);"])).is_err());
        assert!(parse_args(args(&["-c", "out(1);", "prog.cds"])).is_err());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn dump_reports_write_failures() {
        let session = Session::new(&Config::default());
        let err = write_dump(&mut ClosedPipe, &session).expect_err("closed pipe");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let mut buffer = Vec::new();
        write_dump(&mut buffer, &session).expect("write");
        assert_eq!(String::from_utf8(buffer).expect("utf8"), session.render_all());
    }

    #[test]
    fn rejects_unknown_flags_and_missing_values() {
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["--config"])).is_err());
    }
}
