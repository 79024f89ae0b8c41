/// Axis with tick generation and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

impl Axis {
    /// Linear axis with fixed limits and "nice number" ticks inside them.
    ///
    /// Histogram axes have exact edges, so the limits are never widened;
    /// ticks land on nice-step multiples within `[min, max]`.
    pub fn ticked(min: f64, max: f64, target_ticks: usize) -> Self {
        let range = max - min;
        if range.abs() < 1e-15 {
            return Self::fixed(min, max);
        }
        let rough_step = range / (target_ticks.max(2) - 1) as f64;
        let step = nice_step(rough_step);

        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let first = (min / step).ceil();
        let mut k = first;
        while k * step <= max + step * 0.01 {
            let v = (k * step).min(max);
            ticks.push(v);
            labels.push(format_tick(v, step));
            k += 1.0;
        }

        // Minor ticks: 5 subdivisions per major
        let minor_step = step / 5.0;
        let mut minor = Vec::new();
        let mut mv = (min / minor_step).ceil() * minor_step;
        while mv <= max + minor_step * 0.01 {
            if !ticks.iter().any(|t| (t - mv).abs() < minor_step * 0.01) {
                minor.push(mv);
            }
            mv += minor_step;
        }

        Self {
            min,
            max,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Fixed axis with explicit limits (no tick generation).
    pub fn fixed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            label: String::new(),
            tick_positions: Vec::new(),
            tick_labels: Vec::new(),
            minor_ticks: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Map a data value to pixel coordinate.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        px_min + frac * (px_max - px_min)
    }
}

/// "Nice numbers" step for pleasant tick spacing.
fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    if decimals == 0 {
        // Avoid "-0"
        let v = if value.abs() < step * 0.01 { 0.0 } else { value };
        format!("{}", v as i64)
    } else {
        format!("{:.prec$}", value, prec = decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticked_keeps_limits_exact() {
        let ax = Axis::ticked(0.0, 150.0, 8);
        assert_eq!(ax.min, 0.0);
        assert_eq!(ax.max, 150.0);
        assert_eq!(ax.tick_positions.first().copied(), Some(0.0));
        assert!(ax.tick_positions.iter().all(|&t| (0.0..=150.0).contains(&t)));
    }

    #[test]
    fn ticked_energy_axis_steps_by_20() {
        let ax = Axis::ticked(0.0, 150.0, 8);
        assert_eq!(ax.tick_positions[1] - ax.tick_positions[0], 20.0);
        assert_eq!(ax.tick_labels[0], "0");
        assert_eq!(ax.tick_labels[1], "20");
    }

    #[test]
    fn data_to_pixel_linear() {
        let ax = Axis::fixed(0.0, 100.0);
        let px = ax.data_to_pixel(50.0, 0.0, 500.0);
        assert!((px - 250.0).abs() < 1e-9);
    }

    #[test]
    fn inverted_pixel_range_flips() {
        // y axes map min to the bottom (larger pixel value)
        let ax = Axis::fixed(0.0, 10.0);
        let px = ax.data_to_pixel(0.0, 400.0, 0.0);
        assert!((px - 400.0).abs() < 1e-9);
    }

    #[test]
    fn nice_step_values() {
        assert!((nice_step(3.2) - 2.0).abs() < 1e-9);
        assert!((nice_step(0.7) - 0.5).abs() < 1e-9);
        assert!((nice_step(15.0) - 10.0).abs() < 1e-9);
        assert!((nice_step(21.4) - 20.0).abs() < 1e-9);
    }
}
