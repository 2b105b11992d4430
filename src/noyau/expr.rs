// src/noyau/expr.rs
//
// AST exact (sans flottants).
// - Rat : rationnel exact
// - Pi, E : constantes symboliques
// - Indefini : résultat exact indéfini (ex: tan(π/2))
// - Var : variable libre (seul `x` passe la table des symboles)
// - Appel : fonction nommée (ensemble fermé, voir `Fonc`)
//
// IMPORTANT (SAFE):
// - simplify() ne doit jamais “inventer” une valeur pour Var.
// - simplify() ne lève pas d’erreur : les hors-domaine restent symboliques
//   et c’est la lecture numérique qui les signale.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use std::fmt;

use super::symboles::ModeAngle;

/// Factorielle exacte : au-delà, on laisse la lecture numérique (gamma) décider.
const FACTORIELLE_EXACTE_MAX: u64 = 1000;

/// Puissance exacte : borne sur la taille (bits) du résultat.
const PUISSANCE_EXACTE_MAX_BITS: u64 = 1_000_000;

/// Fonctions connues du noyau. L’ensemble est fermé : la table des symboles
/// associe des noms à ces constructeurs, rien d’autre n’est appelable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fonc {
    Abs,
    Ln,
    Log10,
    Exp,
    Floor,
    Ceil,
    Gamma,
    Factorielle,

    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,

    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
}

impl Fonc {
    /// Nom canonique (forme source, réanalysable en mode radians).
    pub const fn nom(self) -> &'static str {
        match self {
            Fonc::Abs => "abs",
            Fonc::Ln => "ln",
            Fonc::Log10 => "log10",
            Fonc::Exp => "exp",
            Fonc::Floor => "floor",
            Fonc::Ceil => "ceil",
            Fonc::Gamma => "gamma",
            Fonc::Factorielle => "factorial",
            Fonc::Sin => "sin",
            Fonc::Cos => "cos",
            Fonc::Tan => "tan",
            Fonc::Asin => "asin",
            Fonc::Acos => "acos",
            Fonc::Atan => "atan",
            Fonc::Sinh => "sinh",
            Fonc::Cosh => "cosh",
            Fonc::Tanh => "tanh",
            Fonc::Asinh => "asinh",
            Fonc::Acosh => "acosh",
            Fonc::Atanh => "atanh",
        }
    }

    /// Trig circulaire : sa liaison dépend du mode d’angle.
    pub const fn est_trig(self) -> bool {
        matches!(
            self,
            Fonc::Sin | Fonc::Cos | Fonc::Tan | Fonc::Asin | Fonc::Acos | Fonc::Atan
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Rat(BigRational),
    Pi,
    E,
    Indefini, // ex: tan(pi/2)

    Var(String),

    Sqrt(Box<Expr>),           // √(x)
    Pow(Box<Expr>, Box<Expr>), // a^b
    Appel(Fonc, Box<Expr>),

    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

/* ------------------------ Constructeurs courts ------------------------ */

pub fn entier(n: i64) -> Expr {
    Expr::Rat(BigRational::from_integer(BigInt::from(n)))
}

pub fn appel(f: Fonc, x: Expr) -> Expr {
    Expr::Appel(f, Box::new(x))
}

pub fn mul(a: Expr, b: Expr) -> Expr {
    Expr::Mul(Box::new(a), Box::new(b))
}

pub fn div(a: Expr, b: Expr) -> Expr {
    Expr::Div(Box::new(a), Box::new(b))
}

/// -x représenté comme 0 - x (utile pour signes / rendu / coeff·π).
pub fn oppose(x: Expr) -> Expr {
    Expr::Sub(Box::new(entier(0)), Box::new(x))
}

impl Expr {
    /// Simplification locale (SAFE), sans heuristiques.
    /// Objectif: réduire ce qui est strictement démontrable sans exploser l’arbre.
    /// Un sous-arbre n’est effacé (0·b, a−a, b⁰, √u·√u) que s’il est défini
    /// partout (`est_defini`) : 0·(1/0) reste tel quel pour la lecture.
    pub fn simplify(self) -> Expr {
        self.simplifie(Effacement::Prouve)
    }

    /// Même simplification, sans garde d’effacement. Réservée aux arbres sans
    /// variable libre que la lecture numérique a déjà parcourus sans erreur.
    pub fn simplify_apres_lecture(self) -> Expr {
        self.simplifie(Effacement::Libre)
    }

    fn simplifie(self, eff: Effacement) -> Expr {
        use Expr::*;

        match self {
            // Feuilles: aucune simplification à faire
            Rat(_) | Pi | E | Indefini | Var(_) => self,

            Add(a, b) => {
                let a = a.simplifie(eff);
                let b = b.simplifie(eff);
                match (&a, &b) {
                    (Indefini, _) | (_, Indefini) => Indefini,
                    (Rat(x), Rat(y)) => Rat(x + y),
                    (Rat(x), _) if x.is_zero() => b,
                    (_, Rat(y)) if y.is_zero() => a,
                    _ => Add(Box::new(a), Box::new(b)),
                }
            }

            Sub(a, b) => {
                let a = a.simplifie(eff);
                let b = b.simplifie(eff);

                if matches!(a, Indefini) || matches!(b, Indefini) {
                    return Indefini;
                }

                // x - x => 0 (renforce la normalisation)
                if a == b && effacable(&a, eff) {
                    return Rat(BigRational::zero());
                }

                match (&a, &b) {
                    (Rat(x), Rat(y)) => Rat(x - y),
                    (_, Rat(y)) if y.is_zero() => a,
                    // 0 - (0 - x) => x
                    (Rat(x), Sub(z, y)) if x.is_zero() && is_zero_expr(z) => (**y).clone(),
                    (Rat(x), _) if x.is_zero() => {
                        // 0 - b => on garde Sub(0,b) (utile pour signes / rendu / coeff·π)
                        Sub(Box::new(Rat(BigRational::zero())), Box::new(b))
                    }
                    _ => Sub(Box::new(a), Box::new(b)),
                }
            }

            Mul(a, b) => {
                let a = a.simplifie(eff);
                let b = b.simplifie(eff);

                if matches!(a, Indefini) || matches!(b, Indefini) {
                    return Indefini;
                }

                // √x * √x => x
                if let (Sqrt(x), Sqrt(y)) = (&a, &b) {
                    if x.as_ref() == y.as_ref() && effacable(&a, eff) {
                        return (*x.clone()).simplifie(eff);
                    }
                }

                // √u * √v => √(u*v) si u,v rationnels >= 0
                if let (Sqrt(u), Sqrt(v)) = (&a, &b) {
                    if let (Rat(ru), Rat(rv)) = (u.as_ref(), v.as_ref()) {
                        if !ru.is_negative() && !rv.is_negative() {
                            return Sqrt(Box::new(Rat(ru.clone() * rv.clone()))).simplifie(eff);
                        }
                    }
                }

                // (√x / k) * √x => x / k  (et symétrique)
                if let (Div(p, q), Sqrt(y)) | (Sqrt(y), Div(p, q)) = (&a, &b) {
                    if let (Sqrt(x), Rat(k)) = (p.as_ref(), q.as_ref()) {
                        if x.as_ref() == y.as_ref() && (eff == Effacement::Libre || racine_definie(y)) {
                            return Div(
                                Box::new((*x.clone()).simplifie(eff)),
                                Box::new(Rat(k.clone())),
                            )
                            .simplifie(eff);
                        }
                    }
                }

                // r * (p / k) => (r/k) * p  (ex: 2 * (√2/2) => √2)
                if let (Rat(r), Div(p, q)) | (Div(p, q), Rat(r)) = (&a, &b) {
                    if let Rat(k) = q.as_ref() {
                        if !k.is_zero() {
                            return Mul(Box::new(Rat(r / k)), p.clone()).simplifie(eff);
                        }
                    }
                }

                match (&a, &b) {
                    (Rat(x), Rat(y)) => Rat(x * y),
                    (Rat(x), _) if x.is_zero() && effacable(&b, eff) => Rat(BigRational::zero()),
                    (_, Rat(y)) if y.is_zero() && effacable(&a, eff) => Rat(BigRational::zero()),
                    (Rat(x), _) if x.is_one() => b,
                    (_, Rat(y)) if y.is_one() => a,
                    _ => Mul(Box::new(a), Box::new(b)),
                }
            }

            Div(a, b) => {
                let a = a.simplifie(eff);
                let b = b.simplifie(eff);

                if matches!(a, Indefini) || matches!(b, Indefini) {
                    return Indefini;
                }

                // division par zéro : on garde symbolique ici (la lecture gérera l’erreur)
                if is_zero_expr(&b) {
                    return Div(Box::new(a), Box::new(b));
                }

                // (c·π) / π => c  (sert aux réciproques en degrés : asin(z)·180/π)
                if matches!(b, Pi) {
                    if let Some(c) = a.as_coeff_pi_ext() {
                        return Rat(c);
                    }
                }

                // √x / √x => 1 (si x rationnel non nul)
                if let (Sqrt(x), Sqrt(y)) = (&a, &b) {
                    if x.as_ref() == y.as_ref() {
                        if let Rat(r) = x.as_ref() {
                            if r.is_positive() {
                                return Rat(BigRational::one());
                            }
                        }
                    }
                }

                // √u / √v => √(u/v) si u,v rationnels > 0
                if let (Sqrt(u), Sqrt(v)) = (&a, &b) {
                    if let (Rat(ru), Rat(rv)) = (u.as_ref(), v.as_ref()) {
                        if ru.is_positive() && rv.is_positive() {
                            return Sqrt(Box::new(Rat(ru.clone() / rv.clone()))).simplifie(eff);
                        }
                    }
                }

                match (&a, &b) {
                    (Rat(x), Rat(y)) => Rat(x / y),
                    (_, Rat(y)) if y.is_one() => a,

                    // (p/q) / √n  => (p/qn) * √n, si n entier > 0
                    (Rat(x), Sqrt(inner)) => {
                        if let Rat(rn) = &**inner {
                            if rn.is_positive() && rn.denom().is_one() {
                                let x_over_n = x.clone() / rn.clone();
                                return Mul(
                                    Box::new(Rat(x_over_n)),
                                    Box::new(Sqrt(Box::new(Rat(rn.clone())))),
                                )
                                .simplifie(eff);
                            }
                        }
                        Div(Box::new(a), Box::new(b))
                    }

                    _ => Div(Box::new(a), Box::new(b)),
                }
            }

            Pow(base, exposant) => {
                let base = base.simplifie(eff);
                let exposant = exposant.simplifie(eff);
                if matches!(base, Indefini) || matches!(exposant, Indefini) {
                    return Indefini;
                }

                if let Rat(n) = &exposant {
                    if n.is_zero() && effacable(&base, eff) {
                        return Rat(BigRational::one());
                    }
                    if n.is_one() {
                        return base;
                    }
                    // x^(1/2) => √x
                    if n == &BigRational::new(BigInt::one(), BigInt::from(2)) {
                        return Sqrt(Box::new(base)).simplifie(eff);
                    }
                    if let (Rat(r), Some(k)) = (&base, entier_i64(n)) {
                        // 0^(-k) : division par zéro, laissée à la lecture
                        if !(r.is_zero() && k < 0) && puissance_raisonnable(r, k) {
                            return Rat(rational_pow_int(r.clone(), k));
                        }
                    }
                    // (√u)^2 => u (u rationnel >= 0)
                    if let (Sqrt(u), Some(2)) = (&base, entier_i64(n)) {
                        if let Rat(ru) = u.as_ref() {
                            if !ru.is_negative() {
                                return Rat(ru.clone());
                            }
                        }
                    }
                }

                Pow(Box::new(base), Box::new(exposant))
            }

            Sqrt(x) => {
                let x = x.simplifie(eff);
                if matches!(x, Indefini) {
                    return Indefini;
                }
                if let Rat(r) = &x {
                    if let Some(s) = rational_sqrt_exact(r) {
                        return Rat(s);
                    }
                }
                Sqrt(Box::new(x))
            }

            Appel(f, x) => {
                let x = x.simplifie(eff);
                if matches!(x, Indefini) {
                    return Indefini;
                }
                simplifie_appel(f, x)
            }
        }
    }

    /// Variables libres (ordre d’apparition, sans doublon).
    /// Itératif + garde-fous : si l'arbre est trop gros, on renvoie "x"
    /// (SAFE => on bloque la lecture numérique plutôt que de geler).
    pub fn variables_libres(&self) -> Vec<String> {
        use Expr::*;

        const MAX_PILE: usize = 8192;
        const MAX_NOEUDS: usize = 200_000;

        let mut vars: Vec<String> = Vec::new();
        let mut pile: Vec<&Expr> = Vec::with_capacity(64);
        pile.push(self);

        let mut visites: usize = 0;

        while let Some(e) = pile.pop() {
            visites += 1;
            if visites > MAX_NOEUDS || pile.len() > MAX_PILE {
                return vec!["x".to_string()];
            }

            match e {
                Var(v) => {
                    if !vars.contains(v) {
                        vars.push(v.clone());
                    }
                }

                Rat(_) | Pi | E | Indefini => {}

                Sqrt(x) | Appel(_, x) => pile.push(x.as_ref()),

                Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Pow(a, b) => {
                    pile.push(b.as_ref());
                    pile.push(a.as_ref());
                }
            }
        }

        vars
    }

    /// Défini pour toute valeur réelle des variables libres, d’après la seule
    /// structure. Conservateur : `false` veut dire « à lire », pas « indéfini ».
    pub fn est_defini(&self) -> bool {
        use Expr::*;
        match self {
            Rat(_) | Pi | E | Var(_) => true,
            Indefini => false,
            Add(a, b) | Sub(a, b) | Mul(a, b) => a.est_defini() && b.est_defini(),
            Div(a, b) => {
                a.est_defini()
                    && match b.as_ref() {
                        Rat(r) => !r.is_zero(),
                        Pi | E => true,
                        _ => false,
                    }
            }
            Sqrt(u) => racine_definie(u),
            Pow(base, n) => {
                base.est_defini() && matches!(n.as_ref(), Rat(r) if r.is_integer() && !r.is_negative())
            }
            Appel(f, u) => {
                u.est_defini()
                    && matches!(
                        f,
                        Fonc::Sin
                            | Fonc::Cos
                            | Fonc::Atan
                            | Fonc::Abs
                            | Fonc::Floor
                            | Fonc::Ceil
                            | Fonc::Tanh
                            | Fonc::Asinh
                    )
            }
        }
    }

    /// Vrai si l’expression contient un appel trig circulaire
    /// (sa forme source changerait de sens selon le mode d’angle).
    pub fn depend_du_mode(&self) -> bool {
        use Expr::*;
        match self {
            Rat(_) | Pi | E | Indefini | Var(_) => false,
            Appel(f, x) => f.est_trig() || x.depend_du_mode(),
            Sqrt(x) => x.depend_du_mode(),
            Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Pow(a, b) => {
                a.depend_du_mode() || b.depend_du_mode()
            }
        }
    }

    /// Détecte un coeff·π sur le domaine Add/Sub/Mul/Div rationnels (itératif, sans flottants).
    /// SAFE: si ça sort du domaine, retourne None.
    pub fn as_coeff_pi_ext(&self) -> Option<BigRational> {
        use Expr::*;

        const MAX_PILE: usize = 8192;
        const MAX_NOEUDS: usize = 200_000;

        #[derive(Copy, Clone)]
        enum Marque<'a> {
            Entrer(&'a Expr),
            Sortir(&'a Expr),
        }

        let mut pile: Vec<Marque<'_>> = Vec::with_capacity(64);
        let mut res: Vec<Option<BigRational>> = Vec::with_capacity(64);

        pile.push(Marque::Entrer(self));

        let mut visites: usize = 0;

        while let Some(m) = pile.pop() {
            visites += 1;
            if visites > MAX_NOEUDS || pile.len() > MAX_PILE {
                return None;
            }

            match m {
                Marque::Entrer(e) => {
                    pile.push(Marque::Sortir(e));
                    if let Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) = e {
                        pile.push(Marque::Entrer(b.as_ref()));
                        pile.push(Marque::Entrer(a.as_ref()));
                    }
                }

                Marque::Sortir(e) => match e {
                    Pi => res.push(Some(BigRational::one())),

                    // On refuse de “pousser” coeff·π à travers fonctions/racines/etc.
                    Rat(_) | E | Indefini | Var(_) | Sqrt(_) | Pow(_, _) | Appel(_, _) => {
                        res.push(None)
                    }

                    Add(_, _) => {
                        let rb = res.pop().flatten();
                        let ra = res.pop().flatten();
                        res.push(match (ra, rb) {
                            (Some(a), Some(b)) => Some(a + b),
                            _ => None,
                        });
                    }

                    Sub(a, _) => {
                        let rb = res.pop().flatten();
                        let ra = res.pop().flatten();

                        // Sub(0, x) => -coeff(x)
                        if is_zero_expr(a) {
                            res.push(rb.map(|cb| -cb));
                            continue;
                        }

                        res.push(match (ra, rb) {
                            (Some(a), Some(b)) => Some(a - b),
                            _ => None,
                        });
                    }

                    Mul(a, b) => {
                        let rb = res.pop().flatten();
                        let ra = res.pop().flatten();

                        // coeff·π * rationnel (dans un sens ou dans l’autre) ;
                        // coeff·π * coeff·π => π² (hors domaine)
                        res.push(match (ra, rb, a.as_ref(), b.as_ref()) {
                            (Some(c), None, _, Rat(r)) => Some(c * r.clone()),
                            (None, Some(c), Rat(r), _) => Some(c * r.clone()),
                            _ => None,
                        });
                    }

                    Div(_, b) => {
                        let _rb = res.pop();
                        let ra = res.pop().flatten();

                        res.push(match (ra, b.as_ref()) {
                            (Some(c), Rat(r)) if !r.is_zero() => Some(c / r.clone()),
                            _ => None,
                        });
                    }
                },
            }
        }

        if res.len() == 1 {
            res.pop().flatten()
        } else {
            None
        }
    }
}

/* ------------------------ Fonctions : valeurs exactes ------------------------ */

/// Simplifications exactes des appels. Tout ce qui n’est pas démontrable
/// reste un `Appel` (la trig spéciale est appliquée à part, avec preuve).
fn simplifie_appel(f: Fonc, x: Expr) -> Expr {
    use Expr::*;

    let garde = |x: Expr| Appel(f, Box::new(x));

    match (f, &x) {
        (Fonc::Abs, Rat(r)) => Rat(r.abs()),
        (Fonc::Abs, Pi | E) => x,
        (Fonc::Abs, Appel(Fonc::Abs, _)) => x,

        (Fonc::Ln, Rat(r)) if r.is_one() => Rat(BigRational::zero()),
        (Fonc::Ln, E) => Rat(BigRational::one()),
        (Fonc::Ln, Appel(Fonc::Exp, a)) => (**a).clone(),

        (Fonc::Log10, Rat(r)) => match puissance_de_dix(r) {
            Some(k) => Rat(BigRational::from_integer(BigInt::from(k))),
            None => garde(x),
        },

        (Fonc::Exp, Rat(r)) if r.is_zero() => Rat(BigRational::one()),
        (Fonc::Exp, Rat(r)) if r.is_one() => E,
        (Fonc::Exp, Appel(Fonc::Ln, a)) if matches!(a.as_ref(), Rat(r) if r.is_positive()) => {
            (**a).clone()
        }

        (Fonc::Floor, Rat(r)) => Rat(r.floor()),
        (Fonc::Ceil, Rat(r)) => Rat(r.ceil()),

        (Fonc::Factorielle, Rat(r)) => match factorielle_exacte(r) {
            Some(v) => Rat(BigRational::from_integer(v)),
            None => garde(x),
        },

        // Γ(n) = (n-1)! ; Γ(1/2) = √π
        (Fonc::Gamma, Rat(r)) if r.is_positive() && r.is_integer() => {
            let n_moins_1 = r - BigRational::one();
            match factorielle_exacte(&n_moins_1) {
                Some(v) => Rat(BigRational::from_integer(v)),
                None => garde(x),
            }
        }
        (Fonc::Gamma, Rat(r)) if r == &BigRational::new(BigInt::one(), BigInt::from(2)) => {
            Sqrt(Box::new(Pi))
        }

        (Fonc::Sinh | Fonc::Tanh | Fonc::Asinh | Fonc::Atanh, Rat(r)) if r.is_zero() => x,
        (Fonc::Cosh, Rat(r)) if r.is_zero() => Rat(BigRational::one()),
        (Fonc::Acosh, Rat(r)) if r.is_one() => Rat(BigRational::zero()),

        _ => garde(x),
    }
}

/// n! exact pour n entier dans [0, FACTORIELLE_EXACTE_MAX].
fn factorielle_exacte(r: &BigRational) -> Option<BigInt> {
    if !r.is_integer() || r.is_negative() {
        return None;
    }
    let n = r.to_integer().to_u64()?;
    if n > FACTORIELLE_EXACTE_MAX {
        return None;
    }
    let mut acc = BigInt::one();
    for k in 2..=n {
        acc *= k;
    }
    Some(acc)
}

/// r = 10^k (k entier relatif) ?
fn puissance_de_dix(r: &BigRational) -> Option<i64> {
    if !r.is_positive() {
        return None;
    }
    let dix = BigInt::from(10);
    let (mut n, signe) = if r.denom().is_one() {
        (r.numer().clone(), 1)
    } else if r.numer().is_one() {
        (r.denom().clone(), -1)
    } else {
        return None;
    };

    let mut k: i64 = 0;
    while !n.is_one() {
        if (&n % &dix).is_zero() {
            n /= &dix;
            k += 1;
        } else {
            return None;
        }
    }
    Some(signe * k)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Effacement {
    /// seulement ce que `est_defini` garantit
    Prouve,
    /// tout : l’arbre a déjà été lu sans erreur
    Libre,
}

fn effacable(e: &Expr, eff: Effacement) -> bool {
    eff == Effacement::Libre || e.est_defini()
}

fn racine_definie(u: &Expr) -> bool {
    match u {
        Expr::Rat(r) => !r.is_negative(),
        Expr::Pi | Expr::E => true,
        _ => false,
    }
}

fn is_zero_expr(e: &Expr) -> bool {
    matches!(e, Expr::Rat(r) if r.is_zero())
}

fn entier_i64(r: &BigRational) -> Option<i64> {
    if r.is_integer() {
        r.to_integer().to_i64()
    } else {
        None
    }
}

fn puissance_raisonnable(base: &BigRational, k: i64) -> bool {
    let bits = base.numer().bits().max(base.denom().bits()).max(1);
    bits.saturating_mul(k.unsigned_abs()) <= PUISSANCE_EXACTE_MAX_BITS
}

/* ------------------------ Modulo rationnel exact (sans flottants) ------------------------ */

/// Réduction modulo `periode` sur un coefficient rationnel (ex: periode=2 pour sin/cos, 1 pour tan).
/// Retourne un rationnel dans [0, periode).
///
/// Si coeff = n/d, alors coeff mod periode = (n mod (periode*d))/d.
pub(crate) fn mod_rationnel(coeff: &BigRational, periode: i64) -> BigRational {
    if periode <= 0 {
        return coeff.clone();
    }
    if coeff.is_zero() {
        return BigRational::zero();
    }

    let d = coeff.denom().clone(); // denom > 0 (num_rational)
    let n = coeff.numer().clone();

    let m = BigInt::from(periode) * &d; // periode*d  (m > 0)

    let mut r = &n % &m;
    if r.is_negative() {
        r += &m;
    }
    BigRational::new(r, d)
}

/* ------------------------ Forme source (réanalysable) ------------------------ */

/// Forme source : chaque sous-expression est parenthésée, les noms sont ceux
/// de la table radians. Sert à la substitution de `ans`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = FormeSource {
            expr: self,
            degres: false,
        };
        fmt::Display::fmt(&source, f)
    }
}

impl Expr {
    /// Forme source à réanalyser dans `mode`. L’arbre a toujours le sens
    /// radians : en degrés, chaque appel trig est compensé
    /// (sin(u) s’écrit sin((u)*180/pi), asin(u) s’écrit (asin(u)*pi/180)).
    pub fn forme_source(&self, mode: ModeAngle) -> String {
        FormeSource {
            expr: self,
            degres: mode == ModeAngle::Degres,
        }
        .to_string()
    }
}

struct FormeSource<'a> {
    expr: &'a Expr,
    degres: bool,
}

impl fmt::Display for FormeSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Expr::*;
        let s = |expr: &Expr| FormeSource {
            expr,
            degres: self.degres,
        }
        .to_string();
        match self.expr {
            Rat(r) => {
                let n = r.numer();
                let d = r.denom();
                match (d.is_one(), n.is_negative()) {
                    (true, false) => write!(f, "{n}"),
                    (true, true) => write!(f, "({n})"),
                    (false, _) => write!(f, "({n}/{d})"),
                }
            }
            Pi => write!(f, "pi"),
            E => write!(f, "e"),
            Indefini => write!(f, "indéfini"),
            Var(v) => write!(f, "{v}"),
            Sqrt(x) => write!(f, "sqrt({})", s(x)),
            Pow(a, b) => write!(f, "({}**{})", s(a), s(b)),
            Appel(fonc @ (Fonc::Sin | Fonc::Cos | Fonc::Tan), x) if self.degres => {
                write!(f, "{}(({})*180/pi)", fonc.nom(), s(x))
            }
            Appel(fonc @ (Fonc::Asin | Fonc::Acos | Fonc::Atan), x) if self.degres => {
                write!(f, "({}({})*pi/180)", fonc.nom(), s(x))
            }
            Appel(fonc, x) => write!(f, "{}({})", fonc.nom(), s(x)),
            Add(a, b) => write!(f, "({}+{})", s(a), s(b)),
            Sub(a, b) => write!(f, "({}-{})", s(a), s(b)),
            Mul(a, b) => write!(f, "({}*{})", s(a), s(b)),
            Div(a, b) => write!(f, "({}/{})", s(a), s(b)),
        }
    }
}

/* ------------------------ Outils rationnels (utilisés par simplify) ------------------------ */

pub(crate) fn rational_pow_int(base: BigRational, exp: i64) -> BigRational {
    if exp == 0 {
        return BigRational::one();
    }
    if exp < 0 {
        let pos = rational_pow_int(base, exp.saturating_neg());
        return BigRational::one() / pos;
    }

    let mut e = exp as u64;
    let mut acc = BigRational::one();
    let mut b = base;

    while e > 0 {
        if (e & 1) == 1 {
            acc *= b.clone();
        }
        e >>= 1;
        if e > 0 {
            b *= b.clone();
        }
    }
    acc
}

fn rational_sqrt_exact(r: &BigRational) -> Option<BigRational> {
    if r.is_negative() {
        return None;
    }
    let sn = int_sqrt_exact(r.numer())?;
    let sd = int_sqrt_exact(r.denom())?;
    Some(BigRational::new(sn, sd))
}

fn int_sqrt_exact(x: &BigInt) -> Option<BigInt> {
    if x.is_negative() {
        return None;
    }
    let s = x.sqrt();
    if &s * &s == *x {
        Some(s)
    } else {
        None
    }
}
