//! Sphere Says demo runner
//!
//! Plays one headless game with the autoplayer and narrates it through the
//! log. Use `RUST_LOG=debug` to see every transition.
//!
//! Usage: `sphere-says [flat|ar] [config.json] [fumble-level]`

use std::process::ExitCode;

use glam::Vec3;

use sphere_says::consts::{MAX_SUBSTEPS, SIM_DT};
use sphere_says::sim::{
    AutoPlayer, Color, GameMode, GameplayCoordinator, ObserverPose, ObserverPoseProvider,
    OrbitNavigator, PresentationSink, SequenceEngine, SpawnLayout,
};
use sphere_says::{GameConfig, SimError};

/// Host frame time, deliberately not a multiple of the sim step
const FRAME_DT: f32 = 1.0 / 45.0;
/// Abandon the demo after this much simulated time
const MAX_DEMO_SECS: f32 = 900.0;
/// Observer eye height for the AR layout (m)
const EYE_HEIGHT: f32 = 1.6;

/// Logs what a real presentation layer would render
struct Narrator;

impl PresentationSink for Narrator {
    fn on_sequence_highlight(&mut self, color: Color) {
        log::info!("  * {color}");
    }

    fn on_color_pressed(&mut self, color: Color) {
        log::info!("  > {color}");
    }

    fn on_round_complete(&mut self, success: bool) {
        log::info!("Round {}", if success { "cleared" } else { "failed" });
    }

    fn on_level_complete(&mut self, level: u32) {
        log::info!("--- Level {level} ---");
    }

    fn on_game_over(&mut self) {
        log::info!("Game over");
    }

    fn on_agent_started_travel(&mut self) {
        log::debug!("Orbiter moving");
    }

    fn on_agent_reached_target(&mut self) {
        log::debug!("Orbiter arrived");
    }

    fn on_candidate_changed(&mut self, color: Option<Color>) {
        log::debug!("Reticle on {color:?}");
    }

    fn on_fault(&mut self, error: &SimError) {
        log::warn!("Fault: {error}");
    }
}

/// Fixed-timestep driver around the coordinator
struct Demo {
    coordinator: GameplayCoordinator,
    player: AutoPlayer,
    pose: Option<ObserverPose>,
    accumulator: f32,
    elapsed: f32,
}

impl Demo {
    fn new(mode: GameMode, config: GameConfig, player: AutoPlayer) -> Result<Self, SimError> {
        let seed: u64 = rand::random();
        log::info!("Seed {seed}");

        let (mut coordinator, pose) = match mode {
            GameMode::Flat => {
                let engine = SequenceEngine::with_seed(config, seed)?;
                (GameplayCoordinator::flat(engine), None)
            }
            GameMode::Augmented => {
                let pose = ObserverPose::new(Vec3::new(0.0, EYE_HEIGHT, 0.0), Vec3::Z);
                let layout = SpawnLayout::around(&pose, config.spawn_distance);
                let mut navigator = OrbitNavigator::from_config(layout.orbit_center, &config)?;
                navigator.place_agent(layout.orbiter_spawn);
                let engine = SequenceEngine::with_seed(config, seed)?;
                let coordinator =
                    GameplayCoordinator::augmented(engine, navigator, Box::new(layout.targets));
                (coordinator, Some(pose))
            }
        };

        coordinator.subscribe("narrator", Box::new(Narrator));
        coordinator.subscribe("autoplayer", Box::new(player.feed()));

        Ok(Self {
            coordinator,
            player,
            pose,
            accumulator: 0.0,
            elapsed: 0.0,
        })
    }

    /// Run simulation ticks for one host frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let pose = self.pose.as_ref().map(|p| p as &dyn ObserverPoseProvider);
            self.coordinator.tick(SIM_DT, pose);
            self.player.tick(SIM_DT, &mut self.coordinator);
            self.accumulator -= SIM_DT;
            self.elapsed += SIM_DT;
            substeps += 1;
        }
    }

    fn run(&mut self) {
        self.coordinator.start_new_game();
        while !self.coordinator.engine().is_game_over() && self.elapsed < MAX_DEMO_SECS {
            self.update(FRAME_DT);
        }
    }
}

fn parse_mode(arg: Option<&str>) -> Result<GameMode, SimError> {
    match arg {
        None | Some("flat") => Ok(GameMode::Flat),
        Some("ar") => Ok(GameMode::Augmented),
        Some(other) => Err(SimError::InvalidConfig(format!(
            "unknown mode '{other}', expected 'flat' or 'ar'"
        ))),
    }
}

fn run() -> Result<(), SimError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_mode(args.first().map(String::as_str))?;
    let config = match args.get(1) {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let mut player = AutoPlayer::default();
    if let Some(level) = args.get(2) {
        let level = level
            .parse()
            .map_err(|_| SimError::InvalidConfig(format!("bad fumble level '{level}'")))?;
        player = player.with_mistake_at(level);
    }

    log::info!("Sphere Says ({mode:?}) up to level {}", config.max_level);
    let mut demo = Demo::new(mode, config, player)?;
    demo.run();

    let engine = demo.coordinator.engine();
    if !engine.is_game_over() {
        log::warn!("Demo stopped after {MAX_DEMO_SECS}s without finishing");
    } else if engine.is_victory() {
        log::info!(
            "Cleared all {} levels in {:.1}s",
            engine.max_level(),
            demo.elapsed
        );
    } else {
        log::info!(
            "Lost on level {} after {:.1}s",
            engine.level(),
            demo.elapsed
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
