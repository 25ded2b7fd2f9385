#![forbid(unsafe_code)]

mod cli;
mod event;
mod reader;

use std::{
    fs::File,
    io::{self, Stdout},
    os::fd::AsFd,
};

use crate::{
    common::Error,
    engine::{Control, JobControl, SignalRelay},
    log::{dev_info, user_error, TshLogger},
    system::dup2,
};

use self::{
    cli::{
        help::{long_help_message, USAGE_MSG},
        TshAction, TshOptions,
    },
    event::{EventRegistry, Process},
    reader::LineReader,
};

const PROMPT: &str = "tsh> ";

pub fn main() {
    let options = match TshOptions::from_env().map_err(Error::Options) {
        Ok(options) => options,
        Err(error) => {
            println_ignore_io_error!("tsh: {error}\n{USAGE_MSG}");
            std::process::exit(1);
        }
    };

    if options.action == TshAction::Help {
        println_ignore_io_error!("{}", long_help_message());
        std::process::exit(0);
    }

    TshLogger::new("tsh: ", options.verbose).into_global_logger();

    match tsh_process(options) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            user_error!("{error}");
            std::process::exit(1);
        }
    }
}

fn tsh_process(options: TshOptions) -> Result<i32, Error> {
    // a driver reading our output sees everything on a single stream
    dup2(&io::stdout(), libc::STDERR_FILENO)?;

    let relay = SignalRelay::install()?;
    let input = File::from(io::stdin().as_fd().try_clone_to_owned()?);

    let mut shell = Shell {
        engine: JobControl::new(relay, io::stdout()),
        reader: LineReader::new(input),
        prompt: options.prompt,
    };

    let mut registry = EventRegistry::new();
    registry.register_read_event(&shell.reader, ShellEvent::Input);
    registry.register_read_event(shell.engine.relay().stream(), ShellEvent::Signal);

    shell.show_prompt();

    Ok(registry.event_loop(&mut shell)?)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ShellEvent {
    Input,
    Signal,
}

struct Shell {
    engine: JobControl<Stdout>,
    reader: LineReader<File>,
    prompt: bool,
}

impl Shell {
    fn show_prompt(&self) {
        if self.prompt {
            print_flush_ignore_io_error!("{PROMPT}");
        }
    }

    fn on_input(&mut self) -> Option<i32> {
        let lines = match self.reader.read_lines() {
            Ok(lines) => lines,
            Err(err) => {
                user_error!("cannot read input: {err}");
                self.engine.terminate_all();
                return Some(1);
            }
        };

        for line in lines {
            match self.engine.evaluate(&line) {
                Ok(Control::Continue) => {}
                Ok(Control::Exit(code)) => return Some(code),
                Err(error) => {
                    user_error!("{error}");
                    return Some(1);
                }
            }

            if !self.reader.is_eof() {
                self.show_prompt();
            }
        }

        if self.reader.is_eof() {
            dev_info!("end of input");
            self.engine.terminate_all();
            return Some(0);
        }

        None
    }

    fn on_signal(&mut self) -> Option<i32> {
        let info = match self.engine.relay().stream().recv() {
            Ok(info) => info,
            Err(err) => {
                user_error!("{}", Error::SignalStream(err));
                return Some(1);
            }
        };

        match self.engine.on_signal(&info) {
            Control::Continue => None,
            Control::Exit(code) => Some(code),
        }
    }
}

impl Process for Shell {
    type Event = ShellEvent;
    type Exit = i32;

    fn on_event(&mut self, event: Self::Event, registry: &mut EventRegistry<Self>) {
        let exit = match event {
            ShellEvent::Input => self.on_input(),
            ShellEvent::Signal => self.on_signal(),
        };

        if let Some(code) = exit {
            registry.set_exit(code);
        }
    }
}
