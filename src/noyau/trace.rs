// src/noyau/trace.rs
//
// Tracé : seul un résultat Symbolique (variable x) est traçable.
// Le domaine est validé tel quel (ni échange min/max, ni valeur par défaut).

use log::warn;
use num_rational::BigRational;

use super::erreur::ErreurCalcul;
use super::eval::Resultat;
use super::expr::Expr;
use super::lecture::Lecteur;

/// Précision de la lecture par point (suffisante pour un f64).
const CHIFFRES_TRACE: usize = 17;

impl Resultat {
    pub fn est_tracable(&self) -> bool {
        matches!(self, Resultat::Symbolique { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RequeteTrace {
    expr: Expr,
    min: f64,
    max: f64,
}

impl RequeteTrace {
    pub fn nouvelle(resultat: &Resultat, min: f64, max: f64) -> Result<Self, ErreurCalcul> {
        let Resultat::Symbolique { expr, .. } = resultat else {
            warn!("tracé refusé : résultat non symbolique");
            return Err(ErreurCalcul::NonTracable);
        };
        if !min.is_finite() || !max.is_finite() || max <= min {
            warn!("tracé refusé : domaine [{min}, {max}]");
            return Err(ErreurCalcul::DomaineTrace { min, max });
        }
        Ok(RequeteTrace {
            expr: expr.clone(),
            min,
            max,
        })
    }

    pub fn domaine(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// `n` points régulièrement espacés (n ≥ 2, bornes comprises).
    /// y = NaN là où la fonction n’est pas définie.
    pub fn echantillonner(&self, n: usize) -> Vec<[f64; 2]> {
        let n = n.max(2);
        let pas = (self.max - self.min) / (n - 1) as f64;

        (0..n)
            .map(|i| {
                let x = if i == n - 1 {
                    self.max
                } else {
                    self.min + pas * i as f64
                };
                [x, self.valeur_en(x)]
            })
            .collect()
    }

    /// Échantillonnage coupé aux points non définis : une suite de morceaux
    /// continus, chacun d’au moins deux points.
    pub fn morceaux(&self, n: usize) -> Vec<Vec<[f64; 2]>> {
        decouper(&self.echantillonner(n))
    }

    fn valeur_en(&self, x: f64) -> f64 {
        let Some(xr) = BigRational::from_float(x) else {
            return f64::NAN;
        };
        Lecteur::new(CHIFFRES_TRACE)
            .avec_x(&xr)
            .approx(&self.expr)
            .map(|a| a.vers_f64())
            .unwrap_or(f64::NAN)
    }
}

fn decouper(points: &[[f64; 2]]) -> Vec<Vec<[f64; 2]>> {
    points
        .split(|p| !p[1].is_finite())
        .filter(|m| m.len() >= 2)
        .map(<[[f64; 2]]>::to_vec)
        .collect()
}
