use rand::Rng;

const GRADIENT: [(f64, u32); 4] = [
    (0.0, 0xF25270),
    (0.3, 0x51548C),
    (0.6, 0x49A68B),
    (1.0, 0xD94848),
];

fn lerp_color(a: u32, b: u32, amount: f64) -> u32 {
    let channel = |shift: u32| {
        let from = ((a >> shift) & 0xff) as f64;
        let to = ((b >> shift) & 0xff) as f64;
        ((from + amount * (to - from)).round() as u32).min(0xff) << shift
    };
    channel(16) | channel(8) | channel(0)
}

/// Samples the display gradient at `amount` in `[0, 1]`.
pub fn gradient_color(amount: f64) -> u32 {
    let amount = amount.clamp(0.0, 1.0);
    for pair in GRADIENT.windows(2) {
        let (start, from) = pair[0];
        let (end, to) = pair[1];
        if amount <= end {
            return lerp_color(from, to, (amount - start) / (end - start));
        }
    }
    GRADIENT[GRADIENT.len() - 1].1
}

pub fn hex_color(value: u32) -> String {
    format!("#{:06X}", value & 0x00ff_ffff)
}

pub fn random_color() -> String {
    let amount = rand::thread_rng().gen::<f64>();
    hex_color(gradient_color(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_hits_stops_exactly() {
        assert_eq!(gradient_color(0.0), 0xF25270);
        assert_eq!(gradient_color(0.3), 0x51548C);
        assert_eq!(gradient_color(0.6), 0x49A68B);
        assert_eq!(gradient_color(1.0), 0xD94848);
    }

    #[test]
    fn hex_is_zero_padded() {
        assert_eq!(hex_color(0x00ff00), "#00FF00");
        assert_eq!(hex_color(0x0000ab), "#0000AB");
    }

    #[test]
    fn random_color_is_hex() {
        let color = random_color();
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));
    }
}
