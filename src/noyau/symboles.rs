// src/noyau/symboles.rs
//
// Table des symboles : ensemble fermé nom -> liaison, construit par mode d’angle.
// Le parseur ne résout un identifiant que par cette table.

use std::collections::BTreeMap;
use std::fmt;

use super::erreur::ErreurCalcul;
use super::expr::{appel, div, entier, mul, Expr, Fonc};

/// Seuil de similarité (strsim) pour proposer un nom voisin.
const SEUIL_SUGGESTION: f64 = 0.3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModeAngle {
    #[default]
    Radians,
    Degres,
}

impl fmt::Display for ModeAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeAngle::Radians => write!(f, "RAD"),
            ModeAngle::Degres => write!(f, "DEG"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Liaison {
    Variable,
    Constante(Expr),
    Fonction(fn(Expr) -> Expr),
}

pub struct TableSymboles {
    mode: ModeAngle,
    liaisons: BTreeMap<&'static str, Liaison>,
}

/* ------------------------ Constructeurs par mode ------------------------ */

/// π/180 : facteur degrés -> radians.
fn deg_vers_rad() -> Expr {
    div(Expr::Pi, entier(180))
}

fn trig_radians() -> [(&'static str, fn(Expr) -> Expr); 6] {
    [
        ("sin", |z: Expr| appel(Fonc::Sin, z)),
        ("cos", |z: Expr| appel(Fonc::Cos, z)),
        ("tan", |z: Expr| appel(Fonc::Tan, z)),
        ("asin", |z: Expr| appel(Fonc::Asin, z)),
        ("acos", |z: Expr| appel(Fonc::Acos, z)),
        ("atan", |z: Expr| appel(Fonc::Atan, z)),
    ]
}

/// Directes : f(z·π/180). Réciproques : f(z)·180/π.
fn trig_degres() -> [(&'static str, fn(Expr) -> Expr); 6] {
    [
        ("sin", |z: Expr| appel(Fonc::Sin, mul(z, deg_vers_rad()))),
        ("cos", |z: Expr| appel(Fonc::Cos, mul(z, deg_vers_rad()))),
        ("tan", |z: Expr| appel(Fonc::Tan, mul(z, deg_vers_rad()))),
        ("asin", |z: Expr| div(mul(appel(Fonc::Asin, z), entier(180)), Expr::Pi)),
        ("acos", |z: Expr| div(mul(appel(Fonc::Acos, z), entier(180)), Expr::Pi)),
        ("atan", |z: Expr| div(mul(appel(Fonc::Atan, z), entier(180)), Expr::Pi)),
    ]
}

/// Fonctions indépendantes du mode.
fn fonctions_communes() -> [(&'static str, fn(Expr) -> Expr); 16] {
    [
        ("sqrt", |z: Expr| Expr::Sqrt(Box::new(z))),
        ("abs", |z: Expr| appel(Fonc::Abs, z)),
        ("ln", |z: Expr| appel(Fonc::Ln, z)),
        ("log", |z: Expr| appel(Fonc::Ln, z)),
        ("log10", |z: Expr| appel(Fonc::Log10, z)),
        ("exp", |z: Expr| appel(Fonc::Exp, z)),
        ("floor", |z: Expr| appel(Fonc::Floor, z)),
        ("ceil", |z: Expr| appel(Fonc::Ceil, z)),
        ("gamma", |z: Expr| appel(Fonc::Gamma, z)),
        ("factorial", |z: Expr| appel(Fonc::Factorielle, z)),
        ("sinh", |z: Expr| appel(Fonc::Sinh, z)),
        ("cosh", |z: Expr| appel(Fonc::Cosh, z)),
        ("tanh", |z: Expr| appel(Fonc::Tanh, z)),
        ("asinh", |z: Expr| appel(Fonc::Asinh, z)),
        ("acosh", |z: Expr| appel(Fonc::Acosh, z)),
        ("atanh", |z: Expr| appel(Fonc::Atanh, z)),
    ]
}

impl TableSymboles {
    pub fn pour_mode(mode: ModeAngle) -> Self {
        let mut liaisons = BTreeMap::new();

        liaisons.insert("x", Liaison::Variable);
        liaisons.insert("pi", Liaison::Constante(Expr::Pi));
        liaisons.insert("π", Liaison::Constante(Expr::Pi));
        liaisons.insert("e", Liaison::Constante(Expr::E));

        for (nom, f) in fonctions_communes() {
            liaisons.insert(nom, Liaison::Fonction(f));
        }

        let trig = match mode {
            ModeAngle::Radians => trig_radians(),
            ModeAngle::Degres => trig_degres(),
        };
        for (nom, f) in trig {
            liaisons.insert(nom, Liaison::Fonction(f));
        }

        TableSymboles { mode, liaisons }
    }

    pub fn mode(&self) -> ModeAngle {
        self.mode
    }

    pub fn get(&self, nom: &str) -> Option<&Liaison> {
        self.liaisons.get(nom)
    }

    pub fn est_fonction(&self, nom: &str) -> bool {
        matches!(self.get(nom), Some(Liaison::Fonction(_)))
    }

    pub fn noms(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.liaisons.keys().copied()
    }

    /// Résout `nom` ou renvoie IdentifiantInconnu, avec le nom le plus proche
    /// si la similarité dépasse le seuil.
    pub fn resoudre(&self, nom: &str) -> Result<&Liaison, ErreurCalcul> {
        self.get(nom).ok_or_else(|| ErreurCalcul::IdentifiantInconnu {
            nom: nom.to_string(),
            suggestion: self.suggestion(nom),
        })
    }

    fn suggestion(&self, nom: &str) -> Option<String> {
        let mut meilleur: Option<(&str, f64)> = None;
        for candidat in self.noms() {
            let score = strsim::normalized_damerau_levenshtein(nom, candidat);
            if score > SEUIL_SUGGESTION && meilleur.map_or(true, |(_, s)| score > s) {
                meilleur = Some((candidat, score));
            }
        }
        meilleur.map(|(c, _)| c.to_string())
    }
}
