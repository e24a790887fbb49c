#[cfg(not(feature = "visualization"))]
fn main() {
    eprintln!("The beatquiz CLI requires the \"visualization\" feature.");
    eprintln!("Rebuild with `--features visualization` to enable it.");
}

#[cfg(feature = "visualization")]
mod cli {
    use std::env;
    use std::io::{self, Read, Write};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::sync::Arc;

    use anyhow::{bail, Context};
    use beatquiz::clock::{AudioClockSource, SilentClock};
    use beatquiz::scheduler::FramePacer;
    use beatquiz::visualization::{create_progress_bar, create_slot_row, create_status_line};
    use beatquiz::{Challenge, GameBeatController, Settings};

    const SLOT_CELL_WIDTH: usize = 9;
    const PROGRESS_BAR_WIDTH: usize = 40;
    /// Extra silence after the last round for the silent track
    const SILENT_TAIL_SECS: f64 = 1.0;

    /// Parsed command-line arguments
    #[derive(Debug, Default)]
    struct CliArgs {
        challenge: Option<PathBuf>,
        settings: Option<PathBuf>,
        track: Option<PathBuf>,
        bpm: Option<f64>,
        offset: Option<f64>,
        silent: bool,
        show_help: bool,
    }

    impl CliArgs {
        fn parse() -> anyhow::Result<Self> {
            let mut args = Self::default();
            let mut iter = env::args().skip(1);

            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--settings" => {
                        let value = iter.next().context("--settings needs a file")?;
                        args.settings = Some(PathBuf::from(value));
                    }
                    "--track" => {
                        let value = iter.next().context("--track needs a file")?;
                        args.track = Some(PathBuf::from(value));
                    }
                    "--bpm" => {
                        let value = iter.next().context("--bpm needs a number")?;
                        args.bpm = Some(value.parse().context("--bpm needs a number")?);
                    }
                    "--offset" => {
                        let value = iter.next().context("--offset needs seconds")?;
                        args.offset = Some(value.parse().context("--offset needs seconds")?);
                    }
                    "--silent" => {
                        args.silent = true;
                    }
                    "--help" | "-h" => {
                        args.show_help = true;
                    }
                    other if other.starts_with("--") => bail!("unknown flag {}", other),
                    _ => {
                        args.challenge = Some(PathBuf::from(&arg));
                    }
                }
            }
            Ok(args)
        }
    }

    fn print_usage() {
        let silent_note = if cfg!(feature = "streaming") {
            ""
        } else {
            " (always on: built without \"streaming\")"
        };
        eprintln!("Usage:");
        eprintln!(
            "  beatquiz [--settings <file.json>] [--track <audio>] [--bpm <n>] \
             [--offset <sec>] [--silent] <challenge.json>"
        );
        eprintln!();
        eprintln!("Flags:");
        eprintln!("  --settings <file>    Load tunables and track path from JSON");
        eprintln!("  --track <file>       Backing track (overrides settings)");
        eprintln!("  --bpm <n>            Tempo of the backing track");
        eprintln!("  --offset <sec>       Detect beats this much earlier");
        eprintln!("  --silent             Play without an audio device{}", silent_note);
        eprintln!("  -h, --help           Show this help");
        eprintln!();
        eprintln!("Keys:");
        eprintln!("  [space] start / retry, [r] restart, [q] quit");
    }

    fn open_clock(
        settings: &Settings,
        challenge: &Challenge,
        silent: bool,
    ) -> anyhow::Result<Box<dyn AudioClockSource>> {
        #[cfg(feature = "streaming")]
        if !silent {
            let clock = beatquiz::RodioClock::open(&settings.track)
                .with_context(|| format!("opening track {}", settings.track.display()))?;
            return Ok(Box::new(clock));
        }
        #[cfg(not(feature = "streaming"))]
        let _ = silent;

        let session_secs = settings.beat.session_beats(challenge.total_rounds()) as f64
            * settings.beat.beat_length();
        Ok(Box::new(SilentClock::new(session_secs + SILENT_TAIL_SECS)?))
    }

    fn spawn_key_reader(running: Arc<AtomicBool>) -> mpsc::Receiver<u8> {
        let (tx, rx) = mpsc::channel::<u8>();
        std::thread::spawn(move || {
            #[cfg(unix)]
            let _ = std::process::Command::new("stty")
                .arg("-echo")
                .arg("raw")
                .status();
            let mut stdin = io::stdin();
            let mut buf = [0u8; 1];
            while running.load(Ordering::Relaxed) {
                if stdin.read_exact(&mut buf).is_ok() {
                    let _ = tx.send(buf[0]);
                    if buf[0] == b'\x03' || buf[0] == b'q' {
                        break;
                    }
                }
            }
        });
        rx
    }

    fn restore_terminal_mode() {
        #[cfg(unix)]
        let _ = std::process::Command::new("stty")
            .arg("echo")
            .arg("-raw")
            .status();
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::init();
        let args = CliArgs::parse()?;

        let Some(challenge_path) = args.challenge.as_ref().filter(|_| !args.show_help) else {
            print_usage();
            return Ok(());
        };

        let mut settings = match &args.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(track) = args.track.clone() {
            settings.track = track;
        }
        if let Some(bpm) = args.bpm {
            settings.beat.bpm = bpm;
        }
        if let Some(offset) = args.offset {
            settings.beat.offset_sec = offset;
        }
        settings.validate()?;

        let challenge = Challenge::load(challenge_path)?;
        let clock = open_clock(&settings, &challenge, args.silent)?;
        let session_secs = settings.beat.session_beats(challenge.total_rounds()) as f64
            * settings.beat.beat_length();

        println!("Challenge: {}", challenge.title);
        println!("Rounds:    {}", challenge.total_rounds());
        println!(
            "Tempo:     {} bpm ({:.3}s per beat, offset {:.3}s)\n",
            settings.beat.bpm,
            settings.beat.beat_length(),
            settings.beat.offset_sec
        );

        let frame_rate_hz = settings.frame_rate_hz;
        let mut game = GameBeatController::new(challenge, settings, clock)?;
        let mut pacer = FramePacer::new(frame_rate_hz);

        let running = Arc::new(AtomicBool::new(true));
        let keys = spawn_key_reader(Arc::clone(&running));

        print!("\x1B[?25l");
        for _ in 0..3 {
            println!();
        }

        while running.load(Ordering::Relaxed) {
            let dt = pacer.wait_next_frame();

            while let Ok(key) = keys.try_recv() {
                match key {
                    b' ' => {
                        game.start();
                    }
                    b'r' | b'R' => {
                        game.restart();
                    }
                    b'q' | b'Q' | b'\x03' => {
                        running.store(false, Ordering::Relaxed);
                    }
                    _ => {}
                }
            }

            game.update(dt);

            let progress = game.elapsed() / session_secs;
            let state = game.render_state();
            print!("\x1B[3A");
            print!("\x1B[2K\r{}\n", create_status_line(&state));
            print!(
                "\x1B[2K\r{}\n",
                create_slot_row(
                    state.current_slots,
                    state.focused_slot,
                    state.show_names,
                    SLOT_CELL_WIDTH
                )
            );
            print!(
                "\x1B[2K\r[{}] {:>5.1}s\n",
                create_progress_bar(progress, PROGRESS_BAR_WIDTH),
                game.elapsed()
            );
            io::stdout().flush().ok();
        }

        drop(game);
        restore_terminal_mode();
        println!("\x1B[?25h");
        io::stdout().flush().ok();
        Ok(())
    }
}

#[cfg(feature = "visualization")]
fn main() -> anyhow::Result<()> {
    cli::run()
}
