use grove::prelude::*;

/// Damage profile shared between turrets.
#[gclass(base = Resource)]
pub struct WeaponStats {
    #[export(placeholder = "Weapon name")]
    pub label: String,

    #[export(range(0, 500, 0.5))]
    #[init(val = 10.0)]
    pub damage: f64,

    /// Shots per second.
    #[export(range(0.1, 20, or_greater))]
    #[init(val = 2.0)]
    pub fire_rate: f64,

    #[export(flags("Fire", "Ice", "Poison:8"))]
    pub elements: i64,

    #[export(color_no_alpha)]
    #[init(val = Color::WHITE)]
    pub tint: Color,
}

#[gclass_impl]
impl WeaponStats {
    #[func]
    fn dps(&self) -> f64 {
        self.damage * self.fire_rate
    }

    /// Damage at `level`, +10% per level above 1.
    #[func]
    fn damage_at(&self, level: i64) -> f64 {
        self.damage * (1.0 + 0.1 * (level.max(1) - 1) as f64)
    }
}
