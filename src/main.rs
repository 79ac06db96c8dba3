//! kidspeak main entry point
//!
//! The quiz loop monitors two sources:
//! 1. stdin (console commands and typed answers)
//! 2. the speech waker (backend threads reporting finished work)
//!
//! and wakes up in time for the orchestrator's next timer.

use clap::Parser;
use kidspeak::config::Config;
use kidspeak::input::{create_default_commands, Command, LineAction, LineBuffer, LineInterpreter};
use kidspeak::platform::is_wsl;
use kidspeak::questions::{progress_marks, ProgressMark, QuestionBank};
use kidspeak::quiz::feedback::level_complete;
use kidspeak::quiz::{AudioCue, DisplayState, HostEvent, NoCue, Orchestrator, Phase, SoundFileCue};
use kidspeak::speech::backends::typed::TypedInputHandle;
use kidspeak::speech::{create_input, create_output, EventSender, SpeechEvent};
use kidspeak::{QuizError, Result};
use log::{debug, error, info, warn};
use mio::{Events, Interest, Poll, Token, Waker};
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

/// Token for stdin in mio poll
const STDIN: Token = Token(0);
/// Token for the speech event waker
const SPEECH: Token = Token(1);

/// Longest the loop sleeps without checking timers and events
const MAX_WAIT: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "kidspeak", version, about = "A spoken picture quiz for young children")]
struct Cli {
    /// Configuration file (default: ~/.kidspeak.cfg)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write debug logs to kidspeak.log
    #[arg(short, long)]
    debug: bool,

    /// Start this level right away (name or menu number)
    #[arg(short, long)]
    level: Option<String>,

    /// Wait for the listen command after each question
    #[arg(long)]
    no_auto_listen: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        // Debug mode: write to kidspeak.log
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("kidspeak.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open kidspeak.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "kidspeak version {} starting (debug mode, logging to kidspeak.log)",
            kidspeak::VERSION
        );
    } else {
        // Normal mode: only errors, unless RUST_LOG asks for more
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .parse_default_env()
            .init();
    }

    if let Err(e) = run(cli) {
        error!("Fatal error: {}", e);
        eprintln!("kidspeak: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    info!("Configuration loaded from {:?}", config.path());

    let bank = match config.questions_path() {
        Some(path) => QuestionBank::from_json_file(&path)?,
        None => QuestionBank::builtin(),
    };

    let mut settings = config.quiz_settings();
    if cli.no_auto_listen {
        settings.auto_listen = false;
    }

    let stdin_fd = io::stdin().as_raw_fd();

    // WSL doesn't support epoll on TTY file descriptors, and epoll never
    // accepts regular files, so fall back to select() for those
    let mut mio_poll = if is_wsl() {
        debug!("Using select() for event loop (WSL mode)");
        None
    } else {
        match register_poll(stdin_fd) {
            Ok(poll) => {
                debug!("Using mio::Poll for event loop");
                Some(poll)
            }
            Err(e) => {
                debug!("mio::Poll unavailable for stdin ({}), using select()", e);
                None
            }
        }
    };

    let (tx, rx) = mpsc::channel();
    let mut events = EventSender::new(tx);
    if let Some((_, _, ref waker)) = mio_poll {
        events = events.with_waker(Arc::clone(waker));
    }

    let output = create_output(&config.speech_settings(), events.clone());
    let (input, typed) = create_input(&config.recognition_settings(), events);
    let cue: Box<dyn AudioCue> = match config.celebration_sound() {
        Some(path) => Box::new(SoundFileCue::new(path)),
        None => Box::new(NoCue),
    };

    let mut console = Console::new(bank, typed);
    let mut quiz = Orchestrator::new(settings, output, input, cue);

    println!("kidspeak {}", kidspeak::VERSION);
    console.print_menu();

    if let Some(ref wanted) = cli.level {
        match console.interpret(wanted) {
            LineAction::SelectLevel(level) => quiz.start_level(level),
            _ => warn!("Unknown level {:?}", wanted),
        }
    }

    info!("kidspeak ready - entering event loop");

    loop {
        drain_speech_events(&rx, &mut quiz);
        quiz.run_due_timers();
        console.render(&mut quiz);

        if console.quit {
            info!("Quit requested");
            return Ok(());
        }

        let timeout = quiz
            .time_until_next_timer()
            .map_or(MAX_WAIT, |d| d.min(MAX_WAIT));

        let stdin_ready = if let Some((ref mut poll, ref mut poll_events, _)) = mio_poll {
            match poll.poll(poll_events, Some(timeout)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    debug!("poll() interrupted by signal");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            poll_events.iter().any(|event| event.token() == STDIN)
        } else {
            select_stdin(stdin_fd, timeout)?
        };

        if stdin_ready && !console.read_stdin(&mut quiz)? {
            info!("stdin closed");
            return Ok(());
        }
    }
}

/// Poll, event buffer and the waker backends use to interrupt it
type PollSet = (Poll, Events, Arc<Waker>);

fn register_poll(stdin_fd: RawFd) -> io::Result<PollSet> {
    let poll = Poll::new()?;

    let mut stdin_source = mio::unix::SourceFd(&stdin_fd);
    poll.registry()
        .register(&mut stdin_source, STDIN, Interest::READABLE)?;

    let waker = Waker::new(poll.registry(), SPEECH)?;
    Ok((poll, Events::with_capacity(16), Arc::new(waker)))
}

/// Wait for stdin with select(); true when it is readable
fn select_stdin(stdin_fd: RawFd, timeout: Duration) -> Result<bool> {
    use nix::sys::select::{select, FdSet};
    use nix::sys::time::{TimeVal, TimeValLike};
    use std::os::unix::io::BorrowedFd;

    // Borrowed for this call only; stdin outlives the loop
    let stdin_borrowed = unsafe { BorrowedFd::borrow_raw(stdin_fd) };

    let mut read_fds = FdSet::new();
    read_fds.insert(stdin_borrowed);
    let mut timeval = TimeVal::milliseconds(timeout.as_millis() as i64);

    match select(None, Some(&mut read_fds), None, None, Some(&mut timeval)) {
        Ok(_) => Ok(read_fds.contains(stdin_borrowed)),
        Err(nix::errno::Errno::EINTR) => {
            debug!("select() interrupted by signal");
            Ok(false)
        }
        Err(e) => {
            error!("select() error: {:?}", e);
            Err(QuizError::Io(io::Error::from_raw_os_error(e as i32)))
        }
    }
}

fn drain_speech_events(rx: &Receiver<SpeechEvent>, quiz: &mut Orchestrator) {
    while let Ok(event) = rx.try_recv() {
        quiz.handle_speech_event(event);
    }
}

/// Console side of the quiz: reads commands, prints what changed
struct Console {
    bank: QuestionBank,
    interpreter: LineInterpreter,
    lines: LineBuffer,
    typed: Option<TypedInputHandle>,
    shown: Option<DisplayState>,
    quit: bool,
}

impl Console {
    fn new(bank: QuestionBank, typed: Option<TypedInputHandle>) -> Self {
        Self {
            bank,
            interpreter: LineInterpreter::new(create_default_commands()),
            lines: LineBuffer::new(),
            typed,
            shown: None,
            quit: false,
        }
    }

    fn answering(&self) -> bool {
        self.typed.as_ref().map_or(false, |t| t.is_waiting())
    }

    fn interpret(&self, line: &str) -> LineAction {
        self.interpreter.interpret(line, self.answering(), &self.bank)
    }

    /// Read what stdin has; false once it is closed
    fn read_stdin(&mut self, quiz: &mut Orchestrator) -> Result<bool> {
        // At least stdin's own buffer size so reads bypass it and poll
        // readiness stays accurate
        let mut buf = [0u8; 8192];

        let n = match io::stdin().read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(true),
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            if let Some(rest) = self.lines.finish() {
                self.handle_line(&rest, quiz);
            }
            return Ok(false);
        }

        for line in self.lines.push(&buf[..n]) {
            self.handle_line(&line, quiz);
        }
        Ok(true)
    }

    fn handle_line(&mut self, line: &str, quiz: &mut Orchestrator) {
        let action = self.interpret(line);
        debug!("Console line {:?} -> {:?}", line, action);

        match action {
            LineAction::Command(Command::Repeat) => quiz.repeat_question(),
            LineAction::Command(Command::Listen) => quiz.start_listening(),
            LineAction::Command(Command::ToggleAutoListen) => {
                let on = quiz.toggle_auto_listen();
                println!("Auto-listen is {}", if on { "on" } else { "off" });
            }
            LineAction::Command(Command::Back) => quiz.back_to_levels(),
            LineAction::Command(Command::Quit) => self.quit = true,
            LineAction::Command(Command::Help) => self.print_help(),
            LineAction::SelectLevel(level) => quiz.start_level(level),
            LineAction::Answer(text) => {
                if let Some(ref typed) = self.typed {
                    typed.submit(&text);
                }
            }
            LineAction::Empty => {}
            LineAction::Unknown(text) => {
                if quiz.in_level() {
                    println!("Type \"l\" first, then your answer. (\"{}\" was not used)", text);
                } else {
                    println!("No level called \"{}\".", text);
                    self.print_menu();
                }
            }
        }
    }

    /// Print host notifications and whatever changed on screen
    fn render(&mut self, quiz: &mut Orchestrator) {
        for event in quiz.drain_host_events() {
            match event {
                HostEvent::QuestionEntered { index, total } => {
                    self.shown = None;
                    println!();
                    println!("Question {} of {}  {}", index + 1, total, progress_strip(index, total));
                }
                HostEvent::LevelCompleted { level } => {
                    self.shown = None;
                    println!();
                    println!("{}", level_complete(&level));
                    self.print_menu();
                }
                HostEvent::ReturnedToLevels => {
                    self.shown = None;
                    self.print_menu();
                }
            }
        }

        let Some(state) = quiz.display() else {
            return;
        };
        let previous = self.shown.take();

        if previous.as_ref().map(|p| &p.prompt) != Some(&state.prompt) {
            if !state.image.is_empty() {
                println!("[picture: {}]", state.image);
            }
            println!("{}", state.prompt);
        }

        let old_feedback = previous.as_ref().and_then(|p| p.feedback.as_ref());
        if state.feedback.as_ref() != old_feedback {
            if let Some(ref feedback) = state.feedback {
                println!("  ({}) {}", feedback.kind.as_str(), feedback.text);
            }
        }

        let old_attempts = previous.as_ref().map_or(0, |p| p.attempts_used);
        if state.attempts_used != old_attempts && state.attempts_used > 0 {
            println!("  Attempts: {}/{}", state.attempts_used, state.max_attempts);
        }

        let was_idle = previous.as_ref().map(|p| p.phase) == Some(Phase::Idle);
        if state.phase == Phase::Idle && !was_idle && !state.auto_listen {
            println!("  Type \"l\" when you are ready to answer.");
        }
        if state.phase == Phase::Listening && self.answering() {
            let was_listening = previous.as_ref().map_or(false, |p| p.phase == Phase::Listening);
            if !was_listening {
                println!("  Type your answer:");
            }
        }

        self.shown = Some(state);
    }

    fn print_menu(&self) {
        println!();
        println!("Choose a level:");
        for (i, name) in self.bank.names().iter().enumerate() {
            println!("  {}. {}", i + 1, name);
        }
        println!("Type a number or a name, or \"h\" for help.");
    }

    fn print_help(&self) {
        println!("Commands:");
        for line in self.interpreter.help_lines() {
            println!("{}", line);
        }
    }
}

fn progress_strip(index: usize, total: usize) -> String {
    progress_marks(index, total)
        .iter()
        .map(|mark| match mark {
            ProgressMark::Completed => "[*]",
            ProgressMark::Current => "[>]",
            ProgressMark::Pending => "[ ]",
        })
        .collect::<Vec<_>>()
        .join(" ")
}
