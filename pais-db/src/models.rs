use anyhow::{bail, Result};

/// Tirage historique : 6 numéros principaux (triés) + 1 numéro fort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub draw_id: u32,
    pub mains: [u8; 6],
    pub strong: u8,
}

impl Draw {
    /// Construit un tirage validé, numéros principaux triés.
    pub fn new(draw_id: u32, mut mains: [u8; 6], strong: u8) -> Result<Self> {
        mains.sort();
        validate_draw(&mains, strong)?;
        Ok(Self { draw_id, mains, strong })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Main,
    Strong,
}

impl Pool {
    pub fn size(&self) -> usize {
        match self {
            Pool::Main => 37,
            Pool::Strong => 7,
        }
    }

    pub fn pick_count(&self) -> usize {
        match self {
            Pool::Main => 6,
            Pool::Strong => 1,
        }
    }

    /// Membres de la pool dans l'ordre croissant.
    pub fn members(self) -> impl Iterator<Item = u8> {
        1..=self.size() as u8
    }

    pub fn contains(&self, n: u8) -> bool {
        n >= 1 && n as usize <= self.size()
    }

    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> &'a [u8] {
        match self {
            Pool::Main => &draw.mains,
            Pool::Strong => std::slice::from_ref(&draw.strong),
        }
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pool::Main => write!(f, "main"),
            Pool::Strong => write!(f, "strong"),
        }
    }
}

pub fn validate_draw(mains: &[u8], strong: u8) -> Result<()> {
    if mains.len() != Pool::Main.pick_count() {
        bail!("{} numéros principaux attendus, {} reçus", Pool::Main.pick_count(), mains.len());
    }
    for &m in mains {
        if !Pool::Main.contains(m) {
            bail!("Numéro {} hors limites (1-37)", m);
        }
    }
    if !Pool::Strong.contains(strong) {
        bail!("Numéro fort {} hors limites (1-7)", strong);
    }
    for i in 0..mains.len() {
        for j in (i + 1)..mains.len() {
            if mains[i] == mains[j] {
                bail!("Numéro en double : {}", mains[i]);
            }
        }
    }
    Ok(())
}
