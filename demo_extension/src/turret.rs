use grove::prelude::*;

use crate::weapon::WeaponStats;

pub const MAX_AMMO: i64 = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ExportEnum)]
pub enum FireMode {
    #[default]
    Single,
    Burst = 3,
    Auto = 10,
}

impl FireMode {
    fn rounds_per_trigger(self) -> i64 {
        match self {
            FireMode::Single | FireMode::Auto => 1,
            FireMode::Burst => 3,
        }
    }

    fn cooldown(self) -> f64 {
        match self {
            FireMode::Auto => 0.1,
            FireMode::Single | FireMode::Burst => 0.5,
        }
    }
}

/// Rotating gun emplacement.
#[gclass(base = Node3D)]
pub struct Turret {
    base: Base<Turret>,

    /// Heading in degrees, 0 facing +Z.
    #[export(range(0, 360, 0.5))]
    yaw: f64,

    #[export]
    mode: FireMode,

    #[group("Ammo", prefix = "ammo_")]
    #[export(range(0, 200, or_greater))]
    #[init(val = 30)]
    ammo_count: i64,

    #[export(file("*.tres", "*.res"))]
    ammo_profile: String,

    #[subgroup("Reload", prefix = "reload_")]
    #[export(exp_easing(attenuation))]
    #[init(val = 1.5)]
    reload_time: f64,

    #[group("")]
    #[export]
    stats: Option<Gd<WeaponStats>>,

    #[export(node_type = "Node3D")]
    target: Option<Gd<Node3D>>,

    cooldown: f64,
    shots_fired: i64,
}

#[gclass_impl]
impl Turret {
    #[vfunc]
    fn ready(&mut self) {
        self.cooldown = 0.0;
        log::debug!("turret #{} ready with {} rounds", self.base.instance_id(), self.ammo_count);
    }

    #[vfunc]
    fn process(&mut self, delta: f64) {
        self.cooldown = (self.cooldown - delta).max(0.0);
    }

    /// Pull the trigger once. Returns whether anything was fired.
    #[func]
    fn fire(&mut self) -> bool {
        if self.cooldown > 0.0 || self.ammo_count == 0 {
            return false;
        }
        let rounds = self.mode.rounds_per_trigger().min(self.ammo_count);
        self.ammo_count -= rounds;
        self.shots_fired += rounds;
        self.cooldown = self.mode.cooldown();
        true
    }

    /// Add `rounds`, capped at [`MAX_AMMO`]. Returns the new count.
    #[func]
    fn reload(&mut self, rounds: i64) -> i64 {
        self.ammo_count = (self.ammo_count + rounds.max(0)).min(MAX_AMMO);
        self.ammo_count
    }

    #[func]
    fn shots_fired(&self) -> i64 {
        self.shots_fired
    }

    #[func]
    fn max_ammo() -> i64 {
        MAX_AMMO
    }

    /// Turn towards `point` (world space). Returns the new yaw.
    #[func]
    fn aim_at(&mut self, point: Vector3) -> GroveResult<f64> {
        let origin = self.base.to_gd()?.position()?;
        let dir = point - origin;
        self.yaw = f64::from(dir.x).atan2(f64::from(dir.z)).to_degrees().rem_euclid(360.0);
        Ok(self.yaw)
    }

    /// Turn towards the exported `target` node, if set.
    #[func]
    fn track_target(&mut self) -> GroveResult<f64> {
        let Some(target) = self.target.clone() else {
            return Ok(self.yaw);
        };
        let point = target.position()?;
        self.aim_at(point)
    }

    /// Expected damage per second of the assigned weapon.
    #[func]
    fn damage_per_second(&self) -> GroveResult<f64> {
        let Some(stats) = &self.stats else {
            return Ok(0.0);
        };
        let stats = stats.bind()?;
        Ok(stats.damage * stats.fire_rate * self.mode.rounds_per_trigger() as f64)
    }
}
