// src/noyau/trig.rs
//
// Trig spéciale (angles “exactement reconnus”)
// -------------------------------------------
// Directes (sin/cos/tan) :
// - Extraction coeff·π via as_coeff_pi_ext()
// - Réduction modulo période via mod_rationnel() (sin/cos: 2 ; tan: 1)
// - Repli par symétrie sur [0, π/2], table sur {0, π/6, π/4, π/3, π/2}
// Réciproques (asin/acos/atan) :
// - Reconnaît les valeurs exactes de la table (0, ±1/2, ±√2/2, ±√3/2, ±1, ±√3, ±√3/3)
//   et renvoie coeff·π.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::expr::{div, entier, mod_rationnel, mul, oppose, Expr, Fonc};
use super::format::{format_coeff_pi, format_expr_pretty};

#[derive(Clone, Debug)]
pub enum TrigOutcome {
    Valeur(Expr, String),
    Indefini(String),
}

fn q(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

/// Reconnaît les valeurs exactes d’un appel trig.
///
/// Retour:
/// - Some(Valeur(expr_exact, preuve)) si reconnu
/// - Some(Indefini(preuve)) si indéfini (tan(π/2), tan(3π/2))
/// - None si non reconnu (ou si `f` n’est pas une trig circulaire)
pub fn trig_special(x: &Expr, f: Fonc) -> Option<TrigOutcome> {
    match f {
        Fonc::Sin | Fonc::Cos | Fonc::Tan => trig_directe(x, f),
        Fonc::Asin | Fonc::Acos | Fonc::Atan => trig_reciproque(x, f),
        _ => None,
    }
}

/* ------------------------ Directes ------------------------ */

fn trig_directe(x: &Expr, f: Fonc) -> Option<TrigOutcome> {
    // 1) extraire coeff·π sur domaine étendu (Add/Sub/Mul/Div rationnels)
    let coeff = x.as_coeff_pi_ext()?;
    let angle_txt = format_coeff_pi(&coeff);

    let valeur = match f {
        Fonc::Sin => sin_special(&coeff)?,
        // cos(θ) = sin(θ + π/2)
        Fonc::Cos => sin_special(&(coeff + q(1, 2)))?,
        _ => match tan_special(&coeff)? {
            Some(v) => v,
            None => {
                return Some(TrigOutcome::Indefini(format!(
                    "tan({angle_txt}) = indéfini"
                )))
            }
        },
    };

    let preuve = format!("{}({angle_txt}) = {}", f.nom(), format_expr_pretty(&valeur));
    Some(TrigOutcome::Valeur(valeur, preuve))
}

/// sin(c·π) exact, c quelconque. Réduction: [0,2) puis symétries sin(π+θ) = -sin(θ),
/// sin(π-θ) = sin(θ).
fn sin_special(coeff: &BigRational) -> Option<Expr> {
    let mut c = mod_rationnel(coeff, 2);
    let mut negatif = false;
    if c >= BigRational::one() {
        c -= BigRational::one();
        negatif = true;
    }
    if c > q(1, 2) {
        c = BigRational::one() - c;
    }

    let v = table_sin(&c)?;
    Some(if negatif { signe_moins(v) } else { v })
}

/// tan(c·π) exact. Some(None) = indéfini.
fn tan_special(coeff: &BigRational) -> Option<Option<Expr>> {
    let mut c = mod_rationnel(coeff, 1);
    let mut negatif = false;
    if c > q(1, 2) {
        c = BigRational::one() - c;
        negatif = true;
    }

    let v = if c.is_zero() {
        entier(0)
    } else if c == q(1, 6) {
        div(racine(3), entier(3))
    } else if c == q(1, 4) {
        entier(1)
    } else if c == q(1, 3) {
        racine(3)
    } else if c == q(1, 2) {
        return Some(None);
    } else {
        return None;
    };

    Some(Some(if negatif { signe_moins(v) } else { v }))
}

/// Table sin sur [0, 1/2] (coeff de π).
fn table_sin(c: &BigRational) -> Option<Expr> {
    if c.is_zero() {
        Some(entier(0))
    } else if c == &q(1, 6) {
        Some(Expr::Rat(q(1, 2)))
    } else if c == &q(1, 4) {
        Some(div(racine(2), entier(2)))
    } else if c == &q(1, 3) {
        Some(div(racine(3), entier(2)))
    } else if c == &q(1, 2) {
        Some(entier(1))
    } else {
        None
    }
}

/* ------------------------ Réciproques ------------------------ */

fn trig_reciproque(x: &Expr, f: Fonc) -> Option<TrigOutcome> {
    let (negatif, v) = valeur_absolue(x);

    // c tel que f(|x|) = c·π
    let c = match f {
        Fonc::Asin => asin_table(&v)?,
        // acos(v) = π/2 - asin(v) ; acos(-v) = π - acos(v)
        Fonc::Acos => q(1, 2) - asin_table(&v)?,
        _ => atan_table(&v)?,
    };

    let c = match (f, negatif) {
        (Fonc::Acos, true) => BigRational::one() - c,
        (_, true) => -c,
        _ => c,
    };

    let preuve = format!(
        "{}({}) = {}",
        f.nom(),
        format_expr_pretty(x),
        format_coeff_pi(&c)
    );
    Some(TrigOutcome::Valeur(
        mul(Expr::Rat(c), Expr::Pi).simplify(),
        preuve,
    ))
}

fn asin_table(v: &Expr) -> Option<BigRational> {
    match v {
        Expr::Rat(r) if r.is_zero() => Some(BigRational::zero()),
        Expr::Rat(r) if r == &q(1, 2) => Some(q(1, 6)),
        Expr::Rat(r) if r.is_one() => Some(q(1, 2)),
        _ if est_racine_sur(v, 2, 2) => Some(q(1, 4)),
        _ if est_racine_sur(v, 3, 2) => Some(q(1, 3)),
        _ => None,
    }
}

fn atan_table(v: &Expr) -> Option<BigRational> {
    match v {
        Expr::Rat(r) if r.is_zero() => Some(BigRational::zero()),
        Expr::Rat(r) if r.is_one() => Some(q(1, 4)),
        Expr::Sqrt(n) if matches!(n.as_ref(), Expr::Rat(r) if r == &q(3, 1)) => Some(q(1, 3)),
        _ if est_racine_sur(v, 3, 3) => Some(q(1, 6)),
        _ => None,
    }
}

/* ------------------------ Outils ------------------------ */

fn racine(n: i64) -> Expr {
    Expr::Sqrt(Box::new(entier(n)))
}

fn signe_moins(v: Expr) -> Expr {
    match v {
        Expr::Rat(r) => Expr::Rat(-r),
        autre => oppose(autre),
    }
}

/// Sépare le signe d’une valeur exacte : Rat négatif ou Sub(0, v).
fn valeur_absolue(x: &Expr) -> (bool, Expr) {
    match x {
        Expr::Rat(r) if r.is_negative() => (true, Expr::Rat(-r.clone())),
        Expr::Sub(z, v) if matches!(z.as_ref(), Expr::Rat(r) if r.is_zero()) => {
            (true, (**v).clone())
        }
        _ => (false, x.clone()),
    }
}

/// v = √n / d, sous l’une des formes produites par simplify :
/// Div(√n, d) ou Mul(1/d, √n) / Mul(√n, 1/d).
fn est_racine_sur(v: &Expr, n: i64, d: i64) -> bool {
    let est_racine = |e: &Expr| matches!(e, Expr::Sqrt(a) if matches!(a.as_ref(), Expr::Rat(r) if r == &q(n, 1)));
    let inverse = q(1, d);
    match v {
        Expr::Div(a, b) => est_racine(a.as_ref()) && matches!(b.as_ref(), Expr::Rat(r) if r == &q(d, 1)),
        Expr::Mul(a, b) => {
            (est_racine(a.as_ref()) && matches!(b.as_ref(), Expr::Rat(r) if r == &inverse))
                || (est_racine(b.as_ref()) && matches!(a.as_ref(), Expr::Rat(r) if r == &inverse))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valeur(x: Expr, f: Fonc) -> Expr {
        match trig_special(&x, f) {
            Some(TrigOutcome::Valeur(v, _)) => v,
            autre => panic!("attendu une valeur pour {f:?}({x}), obtenu {autre:?}"),
        }
    }

    fn pi_sur(k: i64, n: i64) -> Expr {
        div(mul(entier(k), Expr::Pi), entier(n))
    }

    #[test]
    fn sin_table_et_symetries() {
        assert_eq!(valeur(pi_sur(1, 6), Fonc::Sin), Expr::Rat(q(1, 2)));
        assert_eq!(valeur(pi_sur(5, 6), Fonc::Sin), Expr::Rat(q(1, 2)));
        assert_eq!(valeur(pi_sur(7, 6), Fonc::Sin), Expr::Rat(q(-1, 2)));
        assert_eq!(valeur(pi_sur(3, 2), Fonc::Sin), entier(-1));
        assert_eq!(valeur(pi_sur(-1, 2), Fonc::Sin), entier(-1));
    }

    #[test]
    fn cos_par_decalage() {
        assert_eq!(valeur(pi_sur(1, 3), Fonc::Cos), Expr::Rat(q(1, 2)));
        assert_eq!(valeur(Expr::Pi, Fonc::Cos), entier(-1));
        assert_eq!(valeur(pi_sur(1, 2), Fonc::Cos), entier(0));
    }

    #[test]
    fn tan_indefini() {
        assert!(matches!(
            trig_special(&pi_sur(1, 2), Fonc::Tan),
            Some(TrigOutcome::Indefini(_))
        ));
        assert!(matches!(
            trig_special(&pi_sur(3, 2), Fonc::Tan),
            Some(TrigOutcome::Indefini(_))
        ));
        assert_eq!(valeur(pi_sur(3, 4), Fonc::Tan), entier(-1));
    }

    #[test]
    fn angle_hors_table() {
        assert!(trig_special(&pi_sur(1, 5), Fonc::Sin).is_none());
        assert!(trig_special(&entier(30), Fonc::Sin).is_none());
    }

    #[test]
    fn reciproques() {
        let pi_6 = mul(Expr::Rat(q(1, 6)), Expr::Pi);
        assert_eq!(valeur(Expr::Rat(q(1, 2)), Fonc::Asin), pi_6);
        assert_eq!(valeur(entier(1), Fonc::Acos), entier(0));
        assert_eq!(valeur(entier(-1), Fonc::Acos), Expr::Pi);
        assert_eq!(
            valeur(entier(-1), Fonc::Atan),
            mul(Expr::Rat(q(-1, 4)), Expr::Pi)
        );
        assert_eq!(
            valeur(div(racine(2), entier(2)), Fonc::Asin),
            mul(Expr::Rat(q(1, 4)), Expr::Pi)
        );
        assert!(trig_special(&entier(2), Fonc::Asin).is_none());
    }
}
