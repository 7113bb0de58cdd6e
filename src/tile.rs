//! Tile kinds: the six café items the cats ask for.

use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileKind {
    Treat,
    Toy,
    Brush,
    Cushion,
    Catnip,
    Water,
}

impl TileKind {
    pub const ALL: [Self; 6] = [
        Self::Treat,
        Self::Toy,
        Self::Brush,
        Self::Cushion,
        Self::Catnip,
        Self::Water,
    ];

    /// Uniformly random kind.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Treat => "treat",
            Self::Toy => "toy",
            Self::Brush => "brush",
            Self::Cushion => "cushion",
            Self::Catnip => "catnip",
            Self::Water => "water",
        }
    }

    /// One-letter code used by `Grid`'s text form.
    pub fn symbol(&self) -> char {
        match self {
            Self::Treat => 'T',
            Self::Toy => 'Y',
            Self::Brush => 'B',
            Self::Cushion => 'C',
            Self::Catnip => 'N',
            Self::Water => 'W',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.symbol() == c.to_ascii_uppercase())
    }

    /// Colour index 0..6 for `Theme::tile_color`.
    pub fn color_index(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_symbols_round_trip() {
        for kind in TileKind::ALL {
            assert_eq!(TileKind::from_symbol(kind.symbol()), Some(kind));
        }
        assert_eq!(TileKind::from_symbol('n'), Some(TileKind::Catnip));
        assert_eq!(TileKind::from_symbol('.'), None);
    }

    #[test]
    fn test_random_covers_every_kind() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = [false; 6];
        for _ in 0..500 {
            seen[TileKind::random(&mut rng).color_index() as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
