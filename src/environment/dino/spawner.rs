use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::{bail, Error};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::environment::dino::obstacle::{BirdHeight, CactusSize, ObstacleSpec};
use crate::environment::dino::sprites::{LARGE_CACTUS, SMALL_CACTUS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnMode {
    /// fixed distance between two spawns
    Regular,
    /// gap resampled after every spawn
    Random,
}

impl FromStr for SpawnMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(SpawnMode::Regular),
            "random" => Ok(SpawnMode::Random),
            other => bail!("unknown spawn mode '{other}' (expected regular or random)"),
        }
    }
}

impl Display for SpawnMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SpawnMode::Regular => write!(f, "regular"),
            SpawnMode::Random => write!(f, "random"),
        }
    }
}

/// Obstacle categories a user can enable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleCategory {
    Cactus,
    Bird,
    Bonus,
}

impl FromStr for ObstacleCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cactus" => Ok(ObstacleCategory::Cactus),
            "bird" => Ok(ObstacleCategory::Bird),
            "bonus" => Ok(ObstacleCategory::Bonus),
            other => bail!("unknown obstacle kind '{other}'"),
        }
    }
}

/// Parses a comma separated list like `cactus,bird,bonus`.
///
/// Unknown names are skipped with a warning. A list without any entry means cactus only.
pub fn parse_obstacle_kinds(list: &str) -> Vec<ObstacleCategory> {
    let entries: Vec<&str> = list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if entries.is_empty() {
        log::warn!("no obstacle kinds given, using cactus");
        return vec![ObstacleCategory::Cactus];
    }
    entries
        .into_iter()
        .filter_map(|entry| match entry.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                log::warn!("{e}, ignored");
                None
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpawnConfig {
    pub mode: SpawnMode,
    /// Distance between two spawns in regular mode
    pub spawn_distance_px: f32,
    /// Random mode gap range (uniform)
    pub random_gap_min: f32,
    pub random_gap_max: f32,
    pub obstacle_kinds: Vec<ObstacleCategory>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            mode: SpawnMode::Regular,
            spawn_distance_px: 600.0,
            random_gap_min: 400.0,
            random_gap_max: 600.0,
            obstacle_kinds: vec![ObstacleCategory::Cactus, ObstacleCategory::Bird, ObstacleCategory::Bonus],
        }
    }
}

/// What the world reports to a spawn policy each tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnContext {
    pub distance: f32,
    pub live_obstacles: usize,
}

/// Decides once per tick whether a new obstacle appears, and which one.
///
/// Implementations never spawn more than one obstacle per call and never remove obstacles.
pub trait SpawnPolicy {
    /// Called on world reset
    fn reset(&mut self, rng: &mut StdRng);

    fn decide_spawn(&mut self, context: &SpawnContext, rng: &mut StdRng) -> Option<ObstacleSpec>;
}

pub fn build_spawn_policy(config: &SpawnConfig) -> Box<dyn SpawnPolicy> {
    let menu = SpawnMenu::new(&config.obstacle_kinds);
    match config.mode {
        SpawnMode::Regular => Box::new(RegularSpawnPolicy::new(menu, config.spawn_distance_px)),
        SpawnMode::Random => Box::new(RandomSpawnPolicy::new(menu, config.random_gap_min, config.random_gap_max)),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SpawnOption {
    SmallCactus,
    LargeCactus,
    Bird,
    Bonus,
}

/// Uniform choice between the enabled options; cactus counts as two options (small and large)
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnMenu {
    options: Vec<SpawnOption>,
}

impl SpawnMenu {
    pub fn new(kinds: &[ObstacleCategory]) -> Self {
        let mut options = vec![];
        if kinds.contains(&ObstacleCategory::Cactus) {
            options.extend([SpawnOption::SmallCactus, SpawnOption::LargeCactus]);
        }
        if kinds.contains(&ObstacleCategory::Bird) {
            options.push(SpawnOption::Bird);
        }
        if kinds.contains(&ObstacleCategory::Bonus) {
            options.push(SpawnOption::Bonus);
        }
        if options.is_empty() {
            log::warn!("no usable obstacle kind, spawning large cacti only");
            options.push(SpawnOption::LargeCactus);
        }
        Self { options }
    }

    pub fn choose(&self, rng: &mut StdRng) -> ObstacleSpec {
        let option = self.options.choose(rng).copied().unwrap_or(SpawnOption::LargeCactus);
        match option {
            SpawnOption::SmallCactus => ObstacleSpec::Cactus {
                size: CactusSize::Small,
                variant: rng.gen_range(0..SMALL_CACTUS.len()),
            },
            SpawnOption::LargeCactus => ObstacleSpec::Cactus {
                size: CactusSize::Large,
                variant: rng.gen_range(0..LARGE_CACTUS.len()),
            },
            SpawnOption::Bird => ObstacleSpec::Bird {
                height: BirdHeight::ALL[rng.gen_range(0..BirdHeight::ALL.len())],
            },
            SpawnOption::Bonus => ObstacleSpec::Bonus {
                high: rng.gen::<f64>() >= 0.5,
            },
        }
    }
}

/// Shared bookkeeping: the first obstacle appears immediately, later ones after a distance gap
#[derive(Clone, Debug, PartialEq)]
struct SpawnTracker {
    last_spawn_distance: f32,
    first: bool,
}

impl SpawnTracker {
    fn new() -> Self {
        Self {
            last_spawn_distance: 0.0,
            first: true,
        }
    }

    fn is_first_spawn(&self, context: &SpawnContext) -> bool {
        self.first && context.live_obstacles == 0
    }

    fn gap_reached(&self, context: &SpawnContext, gap: f32) -> bool {
        context.distance - self.last_spawn_distance >= gap
    }

    fn spawned_at(&mut self, distance: f32) {
        self.last_spawn_distance = distance;
        self.first = false;
    }
}

pub struct RegularSpawnPolicy {
    menu: SpawnMenu,
    spawn_distance: f32,
    tracker: SpawnTracker,
}

impl RegularSpawnPolicy {
    pub fn new(menu: SpawnMenu, spawn_distance: f32) -> Self {
        Self {
            menu,
            spawn_distance,
            tracker: SpawnTracker::new(),
        }
    }
}

impl SpawnPolicy for RegularSpawnPolicy {
    fn reset(&mut self, _rng: &mut StdRng) {
        self.tracker = SpawnTracker::new();
    }

    fn decide_spawn(&mut self, context: &SpawnContext, rng: &mut StdRng) -> Option<ObstacleSpec> {
        if self.tracker.is_first_spawn(context) || self.tracker.gap_reached(context, self.spawn_distance) {
            self.tracker.spawned_at(context.distance);
            let spec = self.menu.choose(rng);
            log::debug!("spawn {:?} at distance {:.0}", spec, context.distance);
            return Some(spec);
        }
        None
    }
}

pub struct RandomSpawnPolicy {
    menu: SpawnMenu,
    gap_min: f32,
    gap_max: f32,
    next_gap: f32,
    tracker: SpawnTracker,
}

impl RandomSpawnPolicy {
    pub fn new(menu: SpawnMenu, gap_min: f32, gap_max: f32) -> Self {
        Self {
            menu,
            gap_min,
            gap_max,
            next_gap: gap_min,
            tracker: SpawnTracker::new(),
        }
    }

    pub fn next_gap(&self) -> f32 {
        self.next_gap
    }

    fn sample_gap(&self, rng: &mut StdRng) -> f32 {
        if self.gap_max > self.gap_min {
            rng.gen_range(self.gap_min..self.gap_max)
        } else {
            self.gap_min
        }
    }
}

impl SpawnPolicy for RandomSpawnPolicy {
    fn reset(&mut self, rng: &mut StdRng) {
        self.tracker = SpawnTracker::new();
        self.next_gap = self.sample_gap(rng);
    }

    fn decide_spawn(&mut self, context: &SpawnContext, rng: &mut StdRng) -> Option<ObstacleSpec> {
        if self.tracker.is_first_spawn(context) || self.tracker.gap_reached(context, self.next_gap) {
            self.tracker.spawned_at(context.distance);
            let spec = self.menu.choose(rng);
            self.next_gap = self.sample_gap(rng);
            log::debug!(
                "spawn {:?} at distance {:.0}, next gap {:.0}",
                spec,
                context.distance,
                self.next_gap
            );
            return Some(spec);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rstest::rstest;

    use super::*;

    fn context(distance: f32, live_obstacles: usize) -> SpawnContext {
        SpawnContext {
            distance,
            live_obstacles,
        }
    }

    #[rstest]
    #[case("cactus,bird,bonus", vec![ObstacleCategory::Cactus, ObstacleCategory::Bird, ObstacleCategory::Bonus])]
    #[case(" bird , cactus", vec![ObstacleCategory::Bird, ObstacleCategory::Cactus])]
    #[case("", vec![ObstacleCategory::Cactus])]
    #[case(" , ", vec![ObstacleCategory::Cactus])]
    #[case("bird,dragon", vec![ObstacleCategory::Bird])]
    #[case("dragon", vec![])]
    fn test_parse_obstacle_kinds(#[case] list: &str, #[case] expected: Vec<ObstacleCategory>) {
        assert_eq!(parse_obstacle_kinds(list), expected);
    }

    #[rstest]
    #[case(vec![ObstacleCategory::Cactus], 2)]
    #[case(vec![ObstacleCategory::Cactus, ObstacleCategory::Bird, ObstacleCategory::Bonus], 4)]
    #[case(vec![ObstacleCategory::Bird, ObstacleCategory::Bird], 1)]
    #[case(vec![], 1)]
    fn test_menu_options(#[case] kinds: Vec<ObstacleCategory>, #[case] expected: usize) {
        assert_eq!(SpawnMenu::new(&kinds).options.len(), expected);
    }

    #[test]
    fn test_empty_menu_spawns_large_cactus() {
        let mut rng = StdRng::seed_from_u64(1);
        let menu = SpawnMenu::new(&[]);
        for _ in 0..20 {
            assert!(matches!(
                menu.choose(&mut rng),
                ObstacleSpec::Cactus { size: CactusSize::Large, .. }
            ));
        }
    }

    #[test]
    fn test_cactus_only_menu_spawns_both_sizes() {
        let mut rng = StdRng::seed_from_u64(2);
        let menu = SpawnMenu::new(&[ObstacleCategory::Cactus]);
        let specs: Vec<ObstacleSpec> = (0..200).map(|_| menu.choose(&mut rng)).collect();
        let small = specs
            .iter()
            .filter(|s| matches!(s, ObstacleSpec::Cactus { size: CactusSize::Small, .. }))
            .count();
        assert!(specs.iter().all(|s| matches!(s, ObstacleSpec::Cactus { .. })));
        assert!(small > 50 && small < 150);
    }

    #[test]
    fn test_regular_spawns_first_immediately_then_every_gap() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut policy = RegularSpawnPolicy::new(SpawnMenu::new(&[ObstacleCategory::Cactus]), 600.0);
        policy.reset(&mut rng);

        assert!(policy.decide_spawn(&context(6.0, 0), &mut rng).is_some());
        assert!(policy.decide_spawn(&context(12.0, 1), &mut rng).is_none());
        assert!(policy.decide_spawn(&context(605.9, 1), &mut rng).is_none());
        assert!(policy.decide_spawn(&context(606.0, 1), &mut rng).is_some());
        assert!(policy.decide_spawn(&context(900.0, 2), &mut rng).is_none());
        assert!(policy.decide_spawn(&context(1206.0, 2), &mut rng).is_some());
    }

    #[test]
    fn test_regular_reset_restarts_first_spawn() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut policy = RegularSpawnPolicy::new(SpawnMenu::new(&[ObstacleCategory::Bird]), 600.0);
        assert!(policy.decide_spawn(&context(6.0, 0), &mut rng).is_some());
        policy.reset(&mut rng);
        assert!(policy.decide_spawn(&context(6.0, 0), &mut rng).is_some());
    }

    #[test]
    fn test_random_gap_within_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut policy = RandomSpawnPolicy::new(SpawnMenu::new(&[ObstacleCategory::Cactus]), 400.0, 600.0);
        policy.reset(&mut rng);
        assert!(policy.decide_spawn(&context(6.0, 0), &mut rng).is_some());

        let mut last_spawn = 6.0;
        let mut distance = 6.0;
        let mut spawns = 0;
        while spawns < 20 {
            let gap = policy.next_gap();
            assert!((400.0..600.0).contains(&gap));
            distance += 6.0;
            if policy.decide_spawn(&context(distance, 1), &mut rng).is_some() {
                assert!(distance - last_spawn >= gap);
                assert!(distance - last_spawn < gap + 6.0);
                last_spawn = distance;
                spawns += 1;
            }
        }
    }
}
