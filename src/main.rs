// Reference host: minifb window and keypad, cpal beeper.
//
// Separately:
// CPU: cycles_per_frame * 60 times per second
// Display: 60 times per second, redrawn only when the engine marks it dirty
// Timer: 60 times per second, kept by the engine itself

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use emuchip::{Config, Emulator, Quirks, StepOutcome, TimerMode};

use host::{keymap, sound::Beeper, window::Screen};

mod host;

#[derive(Parser)]
#[command(name = "emuchip")]
#[command(about = "Runs a 64x32 hex-keypad virtual machine program")]
struct Args {
    /// Program image, loaded verbatim at 0x200
    rom: PathBuf,

    /// Instructions executed per 60 Hz frame
    #[arg(long, default_value_t = 10)]
    cycles_per_frame: u32,

    /// Window scale factor (1, 2, 4, 8, 16 or 32)
    #[arg(long, default_value_t = 16)]
    scale: u8,

    /// Seed the random instruction for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Decrement timers once per instruction instead of at 60 Hz
    #[arg(long)]
    legacy_timers: bool,

    /// 8XY6/8XYE shift VY into VX
    #[arg(long)]
    shift_quirk: bool,

    /// 8XY1/8XY2/8XY3 reset VF
    #[arg(long)]
    logic_quirk: bool,

    /// BNNN jumps to XNN + VX
    #[arg(long)]
    jump_quirk: bool,

    /// Do not open an audio device
    #[arg(long)]
    mute: bool,

    /// Dump registers and memory on an unknown opcode or a stack fault
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::default().quirks(Quirks {
            shift_uses_vy: self.shift_quirk,
            logic_resets_vf: self.logic_quirk,
            jump_uses_vx: self.jump_quirk,
        });
        if self.legacy_timers {
            config = config.timer_mode(TimerMode::PerStep);
        }
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let program = fs::read(&args.rom)
        .with_context(|| format!("failed to read {}", args.rom.display()))?;

    let mut emu = Emulator::with_config(args.config());
    emu.load_glyph_table();
    emu.load_program(&program)?;
    log::info!("loaded {} ({} bytes)", args.rom.display(), program.len());

    let mut screen = Screen::new(args.scale)?;
    let beeper = if args.mute {
        None
    } else {
        match Beeper::new() {
            Ok(beeper) => Some(beeper),
            Err(err) => {
                log::warn!("sound disabled: {err:#}");
                None
            }
        }
    };

    let mut halted = false;
    while screen.is_open() {
        keymap::apply(&screen.pressed_keys(), emu.keys_mut());

        if !halted {
            for _ in 0..args.cycles_per_frame {
                match emu.step() {
                    Ok(StepOutcome::Unrecognized(_)) if args.debug => dump_state(&emu),
                    Ok(_) => {}
                    Err(err) => {
                        log::error!("{err}; emulation stopped");
                        if args.debug {
                            dump_state(&emu);
                        }
                        halted = true;
                        break;
                    }
                }
            }
        }

        if let Some(beeper) = &beeper {
            beeper.set_active(!halted && emu.is_sound_active());
        }

        if emu.draw_flag() {
            screen.render(emu.frame_buffer())?;
            emu.clear_draw_flag();
        } else {
            screen.update();
        }
    }

    Ok(())
}

fn dump_state(emu: &Emulator) {
    log::info!("registers:\n{}", emu.dump_registers());
    log::info!("memory:\n{}", emu.dump_memory());
}
