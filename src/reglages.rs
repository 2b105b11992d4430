// src/reglages.rs
//
// Réglages de l’application : précision, historique, tracé, journal.
// Valeurs bornées à l’écriture ; lecture optionnelle depuis l’environnement
// (natif seulement, ignorée en wasm). Le domaine de tracé n’est qu’une
// proposition : l’utilisateur le modifie dans le panneau de tracé.

use log::LevelFilter;
use std::str::FromStr;

pub const CHIFFRES_DEFAUT: usize = 20;
pub const CHIFFRES_MIN: usize = 5;
pub const CHIFFRES_MAX: usize = 100;

pub const HISTORIQUE_DEFAUT: usize = 50;
pub const HISTORIQUE_MAX: usize = 1000;

pub const POINTS_DEFAUT: usize = 400;
pub const POINTS_MIN: usize = 2;
pub const POINTS_MAX: usize = 5000;

pub const DOMAINE_DEFAUT: (f64, f64) = (-10.0, 10.0);

/// Variables d’environnement reconnues.
pub const ENV_LOG: &str = "CALCULATRICE_LOG";
pub const ENV_CHIFFRES: &str = "CALCULATRICE_CHIFFRES";
pub const ENV_HISTORIQUE: &str = "CALCULATRICE_HISTORIQUE";

#[derive(Clone, Debug, PartialEq)]
pub struct Reglages {
    chiffres: usize,
    capacite_historique: usize,
    points_trace: usize,
    domaine_trace: (f64, f64),
    niveau_log: LevelFilter,
}

impl Default for Reglages {
    fn default() -> Self {
        Reglages {
            chiffres: CHIFFRES_DEFAUT,
            capacite_historique: HISTORIQUE_DEFAUT,
            points_trace: POINTS_DEFAUT,
            domaine_trace: DOMAINE_DEFAUT,
            niveau_log: LevelFilter::Warn,
        }
    }
}

impl Reglages {
    /// Défauts, puis surcharges éventuelles de l’environnement.
    /// Valeur illisible : défaut conservé.
    pub fn depuis_env() -> Self {
        Self::depuis_lookup(|cle| std::env::var(cle).ok())
    }

    fn depuis_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut r = Reglages::default();

        if let Some(niveau) = lookup(ENV_LOG).and_then(|v| LevelFilter::from_str(v.trim()).ok()) {
            r.niveau_log = niveau;
        }
        if let Some(n) = lookup(ENV_CHIFFRES).and_then(|v| v.trim().parse::<usize>().ok()) {
            r.set_chiffres(n);
        }
        if let Some(n) = lookup(ENV_HISTORIQUE).and_then(|v| v.trim().parse::<usize>().ok()) {
            r.set_capacite_historique(n);
        }
        r
    }

    pub fn chiffres(&self) -> usize {
        self.chiffres
    }

    pub fn capacite_historique(&self) -> usize {
        self.capacite_historique
    }

    pub fn points_trace(&self) -> usize {
        self.points_trace
    }

    pub fn domaine_trace(&self) -> (f64, f64) {
        self.domaine_trace
    }

    pub fn niveau_log(&self) -> LevelFilter {
        self.niveau_log
    }

    pub fn set_chiffres(&mut self, n: usize) {
        self.chiffres = n.clamp(CHIFFRES_MIN, CHIFFRES_MAX);
    }

    pub fn set_capacite_historique(&mut self, n: usize) {
        self.capacite_historique = n.clamp(1, HISTORIQUE_MAX);
    }

    pub fn set_points_trace(&mut self, n: usize) {
        self.points_trace = n.clamp(POINTS_MIN, POINTS_MAX);
    }
}
