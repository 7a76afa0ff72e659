use std::rc::Rc;
use std::thread;

use exchange_widget::{config, RefreshSchedule, SharedRateSource, StaticRates};
use vdom_runtime_std::StdRuntime;

/// Renders the widget headlessly and prints its markup after every rate
/// refresh. Pass `--once` to exit after the first render.
fn main() {
    env_logger::init();

    let once = std::env::args().skip(1).any(|arg| arg == "--once");
    let runtime = StdRuntime::new();
    let mut engine = runtime.engine();
    let container = engine.create_container("body");
    let source: SharedRateSource = Rc::new(StaticRates::default());

    if let Err(err) = exchange_widget::mount(&mut engine, container, source) {
        log::error!("failed to render exchange widget: {err}");
        std::process::exit(1);
    }
    if let Err(err) = runtime.pump(&mut engine) {
        log::error!("initial flush failed: {err}");
        std::process::exit(1);
    }
    println!("{}", engine.document().inner_markup(container));
    if once {
        return;
    }

    let Some(actions) = exchange_widget::actions(&engine) else {
        log::error!("exchange widget is not mounted");
        std::process::exit(1);
    };
    let mut schedule = RefreshSchedule::new(runtime.clock(), config::update_interval());
    log::info!("refreshing rates every {:?}", schedule.interval());
    loop {
        thread::sleep(schedule.remaining());
        if !schedule.is_due() {
            continue;
        }
        schedule.mark();
        actions.update_rates();
        match runtime.pump(&mut engine) {
            Ok(rendered) => {
                log::debug!("refresh re-rendered {rendered} unit(s)");
                println!("{}", engine.document().inner_markup(container));
            }
            Err(err) => log::error!("flush after rate refresh failed: {err}"),
        }
    }
}
