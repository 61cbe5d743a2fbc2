use miditone::input::{input_port_names, KeyboardSource, MidiSource, MidirSource};
use miditone::runtime::NativeSynth;
use miditone::{Result, SynthConfig};
use std::io::{stdin, stdout, BufRead, Write};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  gens            list waveform generators
  gen <name>      select a generator
  amp <x>         set output amplitude multiplier
  mod <0-127>     set mod wheel
  rate <hz>       switch sample rate (restarts the stream)
  start | stop    start or stop audio output
  notes           show held notes
  scope           show the latest rendered block
  quit";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("miditone=info")),
        )
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => SynthConfig::from_json_file(path)?,
        None => SynthConfig::default(),
    };

    let mut synth = NativeSynth::with_cpal(&config)?;
    synth.request_start()?;

    match select_input(config.midi_port) {
        Ok(source) => {
            if let Err(e) = synth.start_listener(Some(source)) {
                warn!("MIDI input disabled: {}", e);
            }
        }
        Err(e) => warn!("MIDI input disabled: {}", e),
    }

    println!("{HELP}");
    control_loop(&mut synth)?;
    synth.shutdown();
    Ok(())
}

/// Opens the configured MIDI port, prompts for one, or falls back to the computer keyboard.
fn select_input(configured: Option<usize>) -> Result<Box<dyn MidiSource>> {
    let names = input_port_names()?;
    if names.is_empty() {
        info!("No MIDI input ports found, using the computer keyboard");
        return Ok(Box::new(KeyboardSource::new()?));
    }

    let index = match configured {
        Some(index) => index,
        None => {
            println!("Available MIDI input ports:");
            for (i, name) in names.iter().enumerate() {
                println!("{}: {}", i, name);
            }
            print!("Select MIDI input port (default 0): ");
            stdout().flush()?;
            let mut input = String::new();
            stdin().read_line(&mut input)?;
            input.trim().parse::<usize>().unwrap_or(0)
        }
    };
    Ok(Box::new(MidirSource::open(index)?))
}

fn control_loop(synth: &mut NativeSynth) -> Result<()> {
    let stdin = stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next();

        let result = match (command, arg) {
            ("quit" | "exit", _) => break,
            ("help", _) => {
                println!("{HELP}");
                Ok(())
            }
            ("gens", _) => {
                let current = synth.synth().params().generator();
                for name in synth.generator_names() {
                    let marker = if name == current.as_str() { "*" } else { " " };
                    println!("{marker} {name}");
                }
                Ok(())
            }
            ("gen", Some(name)) => synth.set_generator(name),
            ("amp", Some(value)) => match value.parse::<f32>() {
                Ok(amplitude) => synth.set_amplitude(amplitude),
                Err(_) => Err(invalid(command, value)),
            },
            ("mod", Some(value)) => match value.parse::<u8>() {
                Ok(wheel) => synth.set_mod_wheel(wheel),
                Err(_) => Err(invalid(command, value)),
            },
            ("rate", Some(value)) => match value.parse::<u32>() {
                Ok(rate) => synth.set_sample_rate(rate),
                Err(_) => Err(invalid(command, value)),
            },
            ("start", _) => synth.request_start(),
            ("stop", _) => synth.request_stop(),
            ("notes", _) => {
                for (note, freq) in synth.active_notes() {
                    println!("{note}: {freq:.2} Hz");
                }
                Ok(())
            }
            ("scope", _) => {
                match synth.scope().latest() {
                    Some(frame) => println!(
                        "t = {:.4}s, {} samples, peak {:.3}",
                        frame.times.first().copied().unwrap_or_default(),
                        frame.samples.len(),
                        frame.peak()
                    ),
                    None => println!("no block rendered yet"),
                }
                Ok(())
            }
            _ => {
                println!("{HELP}");
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("error: {e}");
        }
    }
    Ok(())
}

fn invalid(command: &str, value: &str) -> miditone::Error {
    miditone::Error::InvalidConfig(format!("'{value}' is not a valid value for {command}"))
}
