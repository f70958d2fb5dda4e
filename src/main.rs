//! ttsdeck main entry point
//!
//! The controlling loop monitors two sources through a single channel:
//! 1. stdin (user commands) - forwarded by a reader thread
//! 2. worker completions (synthesis/export outcomes)
//!
//! A receive timeout doubles as the progress tick, so end-of-playback
//! detection needs no extra timer thread.

use log::{debug, error, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use ttsdeck::clock::{self, TICK_INTERVAL};
use ttsdeck::config::{Config, VoiceProfile};
use ttsdeck::event::DeckEvent;
use ttsdeck::janitor::CacheDir;
use ttsdeck::playback::{Controller, PlaybackState, RodioEngine};
use ttsdeck::synth::{AzureSpeech, SpeechService};
use ttsdeck::voices::VoiceCatalog;
use ttsdeck::Result;

fn main() {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    // Initialize logger
    if debug_mode {
        // Debug mode: write to ttsdeck.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("ttsdeck.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!(
                    "Warning: Failed to open ttsdeck.log for debug logging: {}",
                    e
                );
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "ttsdeck version {} starting (debug mode, logging to ttsdeck.log)",
            ttsdeck::VERSION
        );
    } else {
        // Normal mode: minimal logging to stderr, only errors
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run() {
        error!("Fatal error: {}", e);
        eprintln!("Fatal error: {}", e);
        process::exit(1);
    }
}

/// Cache directory for synthesized audio, wiped at startup
fn cache_dir_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ttsdeck")
}

fn run() -> Result<()> {
    debug!("Initializing ttsdeck");

    let mut config = Config::load()?;
    info!("Config loaded from {:?}", config.path());

    let janitor = CacheDir::init(cache_dir_path())?;
    info!("Cache directory: {}", janitor.dir().display());

    let engine = Box::new(RodioEngine::new()?);
    let service: Arc<dyn SpeechService> = Arc::new(AzureSpeech::new());

    let (tx, rx) = mpsc::channel::<DeckEvent>();
    let mut controller = Controller::new(engine, service.clone(), janitor, tx.clone());

    if let Some((key, region)) = config.credentials() {
        info!("Using saved credentials for region {}", region);
        controller.set_credentials(&key, &region);
    }

    // Reader thread: forwards stdin lines into the event channel and
    // announces EOF so the loop can wind down.
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(DeckEvent::Input(line)).is_err() {
                break;
            }
        }
        debug!("stdin closed, reader thread exiting");
        let _ = tx.send(DeckEvent::Shutdown);
    });

    println!("ttsdeck {} ready - type 'help' for commands", ttsdeck::VERSION);
    print_prompt();

    loop {
        match rx.recv_timeout(TICK_INTERVAL) {
            Ok(DeckEvent::Input(line)) => {
                match dispatch(&line, &mut controller, &mut config, service.as_ref()) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("error: {}", e),
                }
                print_prompt();
            }
            Ok(DeckEvent::SynthesisDone {
                params,
                path,
                outcome,
            }) => {
                match controller.on_synthesis_done(params, path, outcome) {
                    Ok(()) => {
                        let (_, total) = controller.progress();
                        println!("\nplaying ({})", clock::format_time(total));
                    }
                    Err(e) => println!("\nsynthesis failed: {}", e),
                }
                print_prompt();
            }
            Ok(DeckEvent::ExportDone { path, outcome }) => {
                match controller.on_export_done(path.clone(), outcome) {
                    Ok(()) => println!("\nexported to {}", path.display()),
                    Err(e) => println!("\nexport failed: {}", e),
                }
                print_prompt();
            }
            Ok(DeckEvent::Shutdown) => {
                info!("Input closed, shutting down");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let before = controller.state();
                controller.tick();
                if before == PlaybackState::Playing
                    && controller.state() == PlaybackState::StoppedByUser
                {
                    println!("\nplayback finished");
                    print_prompt();
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                info!("Event channel closed");
                break;
            }
        }
    }

    controller.shutdown();
    config.save()?;
    info!("ttsdeck exiting");
    Ok(())
}

fn print_prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

/// Execute one command line; returns false to quit
fn dispatch(
    line: &str,
    controller: &mut Controller,
    config: &mut Config,
    service: &dyn SpeechService,
) -> Result<bool> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(true);
    }
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };

    match command {
        "text" => {
            controller.on_text_changed(arg);
            println!("text set ({} chars)", arg.chars().count());
        }
        "lang" => controller.set_language(arg),
        "voice" => controller.set_voice(arg),
        "role" => controller.set_role(arg),
        "style" => controller.set_style(arg),
        "rate" => {
            let rate: f64 = arg
                .parse()
                .map_err(|_| format!("not a number: {}", arg))?;
            controller.set_rate(rate)?;
        }
        "key" => {
            let region = controller.inputs().region.clone();
            controller.set_credentials(arg, &region);
            config.set_credentials(arg, &region);
        }
        "region" => {
            let key = controller.inputs().key.clone();
            controller.set_credentials(&key, arg);
            config.set_credentials(&key, arg);
        }
        "voices" => cmd_voices(controller, service, arg)?,
        "play" => {
            controller.on_play_pause()?;
            if controller.state() == PlaybackState::Synthesizing {
                println!("synthesizing...");
            } else {
                println!("{}", controller.state());
            }
        }
        "stop" => {
            controller.on_stop();
            println!("{}", controller.state());
        }
        "seek" => {
            let target: f64 = arg
                .parse()
                .map_err(|_| format!("not a number: {}", arg))?;
            controller.on_seek_begin();
            controller.on_seek_end(target)?;
            let (pos, total) = controller.progress();
            println!(
                "{} / {} ({})",
                clock::format_time(pos),
                clock::format_time(total),
                controller.state()
            );
        }
        "export" => {
            if arg.is_empty() {
                return Err("usage: export <file.mp3>".into());
            }
            controller.on_export(PathBuf::from(arg))?;
            println!("exporting...");
        }
        "profiles" => {
            let names = config.profile_names();
            if names.is_empty() {
                println!("no saved profiles");
            }
            for name in names {
                println!("  {}", name);
            }
        }
        "save-profile" => {
            if arg.is_empty() {
                return Err("usage: save-profile <name>".into());
            }
            let inputs = controller.inputs();
            let profile = VoiceProfile {
                language: inputs.language.clone(),
                voice: inputs.voice.clone(),
                role: inputs.role.clone(),
                style: inputs.style.clone(),
                rate: inputs.rate,
            };
            config.set_profile(arg, &profile);
            config.save()?;
            println!("profile '{}' saved", arg);
        }
        "profile" => {
            let profile = config
                .profile(arg)
                .ok_or_else(|| format!("no such profile: {}", arg))?;
            controller.apply_profile(&profile);
            println!("profile '{}' applied (voice {})", arg, profile.voice);
        }
        "status" => cmd_status(controller),
        "help" => print_help(),
        "quit" | "exit" => return Ok(false),
        _ => return Err(format!("unknown command: {} (try 'help')", command).into()),
    }
    Ok(true)
}

/// Load the voice catalog, or list voices for a language when one is
/// already loaded and an argument is given
fn cmd_voices(
    controller: &mut Controller,
    service: &dyn SpeechService,
    language: &str,
) -> Result<()> {
    if !language.is_empty() {
        if let Some(catalog) = controller.catalog() {
            for voice in catalog.voices_for(language) {
                println!("  {}", voice.short_name);
            }
            return Ok(());
        }
    }

    let inputs = controller.inputs();
    if inputs.key.is_empty() || inputs.region.is_empty() {
        return Err("set key and region first".into());
    }
    println!("loading voice list...");
    let voices = service
        .list_voices(&inputs.key, &inputs.region)
        .map_err(ttsdeck::DeckError::Synthesis)?;
    let catalog = VoiceCatalog::new(voices, inputs.key.clone(), inputs.region.clone());
    println!(
        "{} voices across {} languages",
        catalog.len(),
        catalog.languages().len()
    );
    controller.set_catalog(catalog);
    Ok(())
}

fn cmd_status(controller: &Controller) {
    let inputs = controller.inputs();
    let (pos, total) = controller.progress();
    println!("state:    {}", controller.state());
    println!(
        "position: {} / {}",
        clock::format_time(pos),
        clock::format_time(total)
    );
    println!("language: {}", inputs.language);
    println!("voice:    {}", inputs.voice);
    println!("role:     {}", inputs.role);
    println!("style:    {}", inputs.style);
    println!("rate:     {:.2}", inputs.rate);
    println!("region:   {}", inputs.region);
    println!(
        "voices:   {}",
        match controller.catalog() {
            Some(c) => format!("{} loaded", c.len()),
            None => "not loaded".to_string(),
        }
    );
    if controller.export_in_flight() {
        println!("export:   in progress");
    }
}

fn print_help() {
    println!("commands:");
    println!("  text <passage>        set the text to synthesize");
    println!("  lang <locale>         set language, e.g. en-US");
    println!("  voice <name>          set voice, e.g. en-US-JennyNeural");
    println!("  role <role>           set role play ('none' to clear)");
    println!("  style <style>         set speaking style ('default' to clear)");
    println!("  rate <factor>         set speaking rate, e.g. 1.25");
    println!("  key <key>             set Azure subscription key");
    println!("  region <region>       set Azure region, e.g. westus");
    println!("  voices [locale]       load the voice list / list voices");
    println!("  play                  play, pause, or resume");
    println!("  stop                  stop and reset position");
    println!("  seek <seconds>        jump to a position");
    println!("  export <file.mp3>     export current text as MP3");
    println!("  profiles              list saved voice profiles");
    println!("  save-profile <name>   save current voice setup");
    println!("  profile <name>        apply a saved voice setup");
    println!("  status                show current state");
    println!("  quit                  exit");
}
