//! Stage Engine Demo
//!
//! Builds a small scene (a walled room, a patrolling walker, an orbiting
//! blade, destructible crates and a turret), runs it for the configured
//! number of ticks, then rebuilds and reruns it to check that both runs
//! end on the same state hash.
//!
//! Usage: `stage-engine [config.json]`

use std::sync::Arc;
use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use stage_engine::{
    VERSION,
    config::EngineConfig,
    core::{Point, StateHash, Vec2},
    engine::{
        hitbox_file::{parse_frame_hitboxes, parse_hitbox_set},
        movement::{apply_knockback, follow_path, orbit, separate, to_body},
        Body, CollisionEngine, CollisionRule, Contact, Entity, Health, HitboxFrames, Motion, PathPolicy,
        PoolId, Prop, Separation, Spin, TickContext, WalkGrid,
    },
};

/// Side length of one grid cell in world units.
const CELL: i32 = 16;

const ROOM: &str = "\
############
#..........#
#..####....#
#.....#....#
#.....#.##.#
#.....#....#
#..........#
############";

const WALKER_HITBOXES: &str = "\
body;0,0,12,12;6,6
feet;2,8,8,4;6,10";

const BLADE_FRAMES: &str = "\
# 2
blade;0,0,10,10;5,5
# 2
blade;-2,-2,14,14;5,5";

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => EngineConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Stage Engine v{}", VERSION);
    info!("Tick Rate: {} Hz", config.tick_rate);
    info!("Run Length: {} ticks ({} seconds)", config.max_ticks, config.max_ticks / config.tick_rate as u64);

    info!("=== Starting Demo Run ===");
    let hash = run_scene(&config)?;
    info!("Final State Hash: {}", hex::encode(hash));

    info!("=== Verifying Determinism ===");
    let replay_hash = run_scene(&config)?;
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        bail!("determinism failure: {} != {}", hex::encode(hash), hex::encode(replay_hash));
    }
}

// =============================================================================
// SCENE
// =============================================================================

/// Pool handles used by the demo entities.
#[derive(Clone, Copy)]
struct ScenePools {
    walls: PoolId,
    walkers: PoolId,
    blades: PoolId,
    crates: PoolId,
    turrets: PoolId,
    bolts: PoolId,
}

fn run_scene(config: &EngineConfig) -> Result<StateHash> {
    let mut engine = CollisionEngine::new();
    let pools = build_scene(&mut engine, config)?;

    let mut ctx = TickContext::new(config.tick_rate);
    let mut total_collisions = 0;
    let report_every = (config.tick_rate as u64 * 2).max(1);

    for _ in 0..config.max_ticks {
        let report = engine.step(&mut ctx);
        total_collisions += report.collisions;

        if report.reaped > 0 {
            debug!(tick = report.tick, reaped = report.reaped, "Reaped entities");
        }
        if report.tick % report_every == 0 {
            info!(
                "Tick {}: {} entities, {} crates, {} bolts, {} hits so far",
                report.tick,
                engine.len(),
                engine.members(pools.crates).len(),
                engine.members(pools.bolts).len(),
                total_collisions,
            );
        }
        ctx.advance();
    }

    let hash = engine.state_hash(ctx.tick);
    info!("Entities left: {}, total hits: {}", engine.len(), total_collisions);
    Ok(hash)
}

fn build_scene(engine: &mut CollisionEngine, config: &EngineConfig) -> Result<ScenePools> {
    let pools = ScenePools {
        walls: engine.pool("walls"),
        walkers: engine.pool("walkers"),
        blades: engine.pool("blades"),
        crates: engine.pool("crates"),
        turrets: engine.pool("turrets"),
        bolts: engine.pool("bolts"),
    };

    let grid = WalkGrid::from_ascii(ROOM).context("parsing room grid")?;
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if !grid.is_walkable(Point::new(x, y)) {
                let wall = Body::sized(cell_to_world(Point::new(x, y)), CELL, CELL);
                engine.spawn_into(pools.walls, Prop::new(wall));
            }
        }
    }

    // Walker patrols between two corners of the room
    let cells = grid.find_path(Point::new(1, 1), Point::new(10, 6), config.allow_diagonal_paths);
    if cells.is_empty() {
        bail!("no walkable route across the room");
    }
    info!("Walker route: {} cells", cells.len());
    let route: Vec<Vec2> = cells
        .windows(2)
        .map(|pair| (pair[1].to_vec2() - pair[0].to_vec2()) * CELL as f32)
        .collect();

    let walker_hitboxes = Arc::new(parse_hitbox_set(WALKER_HITBOXES).context("walker hitboxes")?);
    let walker_body = Body::new(cell_to_world(cells[0]), 12, 12, walker_hitboxes)
        .with_origin(Vec2::new(6.0, 6.0))
        .with_motion(Motion::new(1.5).with_path(route));
    engine.spawn_into(pools.walkers, Walker { body: walker_body, weight: config.separation_weight });

    // Blade circling the middle of the room
    let frames = parse_frame_hitboxes(BLADE_FRAMES, 4).context("blade hitboxes")?;
    let center = cell_to_world(Point::new(4, 4));
    let mut blade_motion = Motion::new(2.0);
    blade_motion.is_moving = true;
    let blade_body = Body::sized(center + Vec2::new(40.0, 0.0), 10, 10)
        .with_motion(blade_motion)
        .with_animation(HitboxFrames::new(frames));
    engine.spawn_into(pools.blades, Blade { body: blade_body, center });

    for cell in [Point::new(2, 5), Point::new(4, 6), Point::new(8, 2), Point::new(9, 5)] {
        let body = Body::sized(cell_to_world(cell), CELL, CELL).with_health(Health::new(20.0));
        engine.spawn_into(pools.crates, Prop::new(body));
    }

    let turret = Body::sized(cell_to_world(Point::new(10, 1)), CELL, CELL);
    engine.spawn_into(pools.turrets, Turret { body: turret, bolts: pools.bolts, period: config.tick_rate as u64 });

    engine.register_for_update(&[pools.walkers, pools.blades, pools.turrets, pools.bolts]);

    engine.add_collision_rule(CollisionRule::new(pools.walkers, pools.walls).with_source_hitbox("feet"));
    engine.add_collision_rule(CollisionRule::new(pools.walkers, pools.crates).with_source_hitbox("feet"));
    engine.add_collision_rule(CollisionRule::new(pools.blades, pools.crates).moving_only());
    engine.add_collision_rule(CollisionRule::new(pools.blades, pools.walkers).with_target_hitbox("body"));
    engine.add_collision_rule(CollisionRule::new(pools.bolts, pools.walls));
    engine.add_collision_rule(CollisionRule::new(pools.bolts, pools.crates));

    info!("Scene built: {} entities, {} rules", engine.len(), engine.rule_count());
    Ok(pools)
}

fn cell_to_world(cell: Point) -> Vec2 {
    cell.to_vec2() * CELL as f32
}

// =============================================================================
// ENTITIES
// =============================================================================

/// Follows its route back and forth, pushed out of walls and crates.
struct Walker {
    body: Body,
    weight: f32,
}

impl Entity for Walker {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &mut TickContext) {
        follow_path(&mut self.body, PathPolicy::Patrol);
        apply_knockback(&mut self.body);
    }

    fn on_collision(&mut self, target: &mut dyn Entity, contact: &Contact<'_>) {
        separate(
            &mut self.body,
            target.body(),
            contact.intersections,
            self.weight,
            contact.source_hitbox,
            contact.target_hitbox,
            Separation::Detailed,
        );
    }
}

/// Animated blade orbiting a fixed point. Chips crates and shoves walkers.
struct Blade {
    body: Body,
    center: Vec2,
}

impl Entity for Blade {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &mut TickContext) {
        orbit(&mut self.body, self.center, Spin::Clockwise);
        if let Some(frames) = self.body.animation.as_mut() {
            frames.advance();
        }
    }

    fn on_collision(&mut self, target: &mut dyn Entity, _contact: &Contact<'_>) {
        let shove = to_body(&self.body, target.body()).normalize() * 3.0;
        let target = target.body_mut();
        match target.motion.as_mut() {
            Some(motion) => motion.knockback = shove,
            None => {
                if target.damage(1.0) {
                    info!("Crate destroyed at {}", target.position.to_point());
                }
            }
        }
    }
}

/// Fires a bolt to the left once per `period` ticks.
struct Turret {
    body: Body,
    bolts: PoolId,
    period: u64,
}

impl Entity for Turret {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, ctx: &mut TickContext) {
        if ctx.tick % self.period.max(1) != 0 {
            return;
        }
        let muzzle = self.body.center_position() - Vec2::new(CELL as f32, 2.0);
        let mut motion = Motion::new(3.0);
        motion.velocity = Vec2::LEFT * motion.speed;
        motion.is_moving = true;
        let body = Body::sized(muzzle, 4, 4).with_motion(motion).with_health(Health::new(1.0));
        ctx.spawn(self.bolts, Bolt { body });
    }
}

/// Travels in a straight line until it hits a wall or a crate.
struct Bolt {
    body: Body,
}

impl Entity for Bolt {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, _ctx: &mut TickContext) {
        if let Some(motion) = self.body.motion.as_ref() {
            self.body.position += motion.velocity;
        }
    }

    fn on_collision(&mut self, target: &mut dyn Entity, _contact: &Contact<'_>) {
        if target.body_mut().damage(5.0) {
            debug!("Bolt destroyed a crate");
        }
        self.body.alive = false;
    }
}
