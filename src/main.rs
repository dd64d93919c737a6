use anyhow::Result;
use calloop::EventLoop;
use calloop::signals::{Signal, Signals};
use clap::{Parser, Subcommand};
use gridlaunch::config::{Config, Context, Paths};
use gridlaunch::executor::{ShellSpawner, Spawn};
use gridlaunch::instance;
use gridlaunch::sources::Source;
use gridlaunch::sources::bar::BarSource;
use gridlaunch::sources::bin::BinSource;
use gridlaunch::sources::desktop::app_dirs;
use gridlaunch::state::{ControlEvent, GridState, MenuState};
use gridlaunch::store::case::{CaseMode, CaseSetting};
use gridlaunch::ui::console::{self, Command, Outcome};
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Read};
use std::cell::RefCell;
use std::rc::Rc;
use std::thread;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Application grid with pinned and most used entries on top
    Grid {
        /// Print the view for this phrase and exit
        #[arg(short, long)]
        query: Option<String>,
        /// Stay alive after launching and rebuild the index on SIGUSR1
        #[arg(short, long)]
        daemon: bool,
    },
    /// Run dialog over piped commands or the executables on $PATH
    Dmenu {
        /// Spawn the selection instead of printing it
        #[arg(short, long)]
        run: bool,
        /// Print the view for this phrase and exit
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Button bar from the bar JSON file
    Bar,
    /// Ask the running grid daemon to rebuild its index
    Refresh,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let paths = Paths::from_env()?;
    let config = Config::load(&paths.config_file())?;
    let ctx = Context::from_env(config, paths);
    log::info!("locale={} wm={}", ctx.locale, ctx.wm);

    match args.mode {
        Mode::Grid { query, daemon } => run_grid(ctx, query, daemon),
        Mode::Dmenu { run, query } => run_dmenu(ctx, run, query),
        Mode::Bar => run_bar(ctx),
        Mode::Refresh => {
            instance::send_refresh(&ctx.paths.pid_file("grid"))?;
            Ok(())
        }
    }
}

fn run_grid(ctx: Context, query: Option<String>, daemon: bool) -> Result<()> {
    let dirs = app_dirs(&ctx.paths, std::env::var("XDG_DATA_DIRS").ok().as_deref());
    let pid_file = ctx.paths.pid_file("grid");
    let mut state = GridState::load(ctx, dirs)?;

    if let Some(query) = query {
        state.update_query(&query);
        print!("{}", console::render_grid(&state));
        return Ok(());
    }

    let _guard = instance::register(&pid_file)?;
    print!("{}", console::render_grid(&state));
    run_console(
        state,
        &[Signal::SIGUSR1, Signal::SIGTERM, Signal::SIGINT],
        false,
        daemon,
        move |state, command| {
            match console::apply_grid(state, command, &ShellSpawner)? {
                Outcome::Quit => return Ok(false),
                Outcome::Activated(exec) => {
                    log::info!("Launched {}", exec);
                    if !daemon {
                        return Ok(false);
                    }
                    state.update_query("");
                }
                Outcome::Redraw | Outcome::Ignored => {}
            }
            print!("{}", console::render_grid(state));
            Ok(true)
        },
        |state, signal| {
            let event = match signal {
                Signal::SIGUSR1 => ControlEvent::Refresh,
                _ => ControlEvent::Quit,
            };
            let keep = state.handle(event);
            if keep {
                print!("{}", console::render_grid(state));
            }
            keep
        },
    )?;
    Ok(())
}

fn run_dmenu(ctx: Context, run: bool, query: Option<String>) -> Result<()> {
    let piped = !io::stdin().is_terminal();
    let commands = if piped {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        input.lines().filter(|l| !l.is_empty()).map(str::to_string).collect()
    } else {
        BinSource::from_env().scan()?
    };

    let case = CaseSetting::load(&ctx.paths.case_setting());
    let mut state = MenuState::new(commands, ctx.config.dmenu.rows, case);

    if let Some(query) = query {
        state.update_query(&query);
        print!("{}", console::render_menu(&state));
        return Ok(());
    }

    let _guard = instance::register(&ctx.paths.pid_file("dmenu"))?;
    let show_searchbox = ctx.config.dmenu.show_searchbox;
    // The view goes to stderr so stdout carries only the selection
    eprint!("{}", console::render_menu(&state));
    run_console(
        state,
        &[Signal::SIGTERM, Signal::SIGINT],
        piped,
        false,
        move |state, command| {
            if !show_searchbox && matches!(command, Command::Search(_) | Command::ToggleCase) {
                return Ok(true);
            }
            match console::apply_menu(state, command) {
                Outcome::Quit => return Ok(false),
                Outcome::Activated(cmd) => {
                    if run {
                        ShellSpawner.spawn(&cmd)?;
                    } else {
                        println!("{cmd}");
                    }
                    return Ok(false);
                }
                Outcome::Redraw | Outcome::Ignored => {}
            }
            eprint!("{}", console::render_menu(state));
            Ok(true)
        },
        |_, _| false,
    )?;
    Ok(())
}

fn run_bar(ctx: Context) -> Result<()> {
    let entries = BarSource { path: ctx.paths.bar_file(&ctx.config.bar) }.scan()?;
    let rows = entries.len();
    let state = MenuState::new(entries, rows, CaseSetting::transient(CaseMode::Insensitive));

    let _guard = instance::register(&ctx.paths.pid_file("bar"))?;
    print!("{}", console::render_menu(&state));
    run_console(
        state,
        &[Signal::SIGTERM, Signal::SIGINT],
        false,
        false,
        |state, command| {
            match console::apply_menu(state, command) {
                Outcome::Quit => return Ok(false),
                Outcome::Activated(cmd) => {
                    ShellSpawner.spawn(&cmd)?;
                    return Ok(false);
                }
                Outcome::Redraw | Outcome::Ignored => {}
            }
            print!("{}", console::render_menu(state));
            Ok(true)
        },
        |_, _| false,
    )?;
    Ok(())
}

struct LoopData<S> {
    state: S,
    should_exit: bool,
}

/// Feeds console lines and OS signals to `state` until a handler returns
/// false, or input ends without `outlive_input`. With `from_tty` the lines
/// are read from the controlling terminal because stdin already carried the
/// command list.
fn run_console<S>(
    state: S,
    signals: &[Signal],
    from_tty: bool,
    outlive_input: bool,
    mut on_command: impl FnMut(&mut S, Command) -> Result<bool>,
    mut on_signal: impl FnMut(&mut S, Signal) -> bool,
) -> Result<S> {
    let mut event_loop: EventLoop<LoopData<S>> = EventLoop::try_new()?;

    // Block the signals before the reader thread exists so it inherits the mask
    let signal_source = Signals::new(signals)?;
    event_loop.handle().insert_source(signal_source, move |event, _, data: &mut LoopData<S>| {
        if !on_signal(&mut data.state, event.signal()) {
            data.should_exit = true;
        }
    }).map_err(|e| e.error)?;

    let (tx_lines, rx_lines) = calloop::channel::channel::<String>();
    let failure = Rc::new(RefCell::new(None));
    let failure_slot = Rc::clone(&failure);
    event_loop.handle().insert_source(rx_lines, move |event, _, data: &mut LoopData<S>| {
        match event {
            calloop::channel::Event::Msg(line) => match on_command(&mut data.state, console::parse(&line)) {
                Ok(true) => {}
                Ok(false) => data.should_exit = true,
                Err(e) => {
                    *failure_slot.borrow_mut() = Some(e);
                    data.should_exit = true;
                }
            },
            calloop::channel::Event::Closed => {
                if !outlive_input {
                    data.should_exit = true;
                }
            }
        }
    }).map_err(|e| e.error)?;

    thread::spawn(move || {
        let reader: Box<dyn BufRead> = if from_tty {
            match File::open("/dev/tty") {
                Ok(tty) => Box::new(BufReader::new(tty)),
                Err(e) => {
                    log::error!("No terminal for input: {}", e);
                    return;
                }
            }
        } else {
            Box::new(io::stdin().lock())
        };
        for line in reader.lines().map_while(|l| l.ok()) {
            if tx_lines.send(line).is_err() {
                break;
            }
        }
    });

    let mut data = LoopData { state, should_exit: false };
    loop {
        if data.should_exit {
            break;
        }
        event_loop.dispatch(None, &mut data)?;
    }

    if let Some(e) = failure.borrow_mut().take() {
        return Err(e);
    }
    Ok(data.state)
}
