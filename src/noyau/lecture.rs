// src/noyau/lecture.rs
//
// Lecture numérique : virgule fixe sur BigInt (entier “scalé” ×10^prec).
// - prec = chiffres affichés + GARDE (chiffres de garde)
// - constantes (π, ln 2, ln 10) et nombres de Bernoulli en cache
// - le résultat est arrondi au plus proche sur `chiffres` décimales (Approx)

use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Pow, Signed, ToPrimitive, Zero};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

use super::erreur::ErreurCalcul;
use super::expr::{Expr, Fonc};

/// Chiffres de garde ajoutés à la précision de travail.
const GARDE: usize = 10;

/// exp(x) refusé au-delà (≈ 10^8686).
const EXP_MAX: i64 = 20_000;

/// Taille maximale (bits) d’un intermédiaire scalé.
const MAX_BITS: u64 = 400_000;

/// Exposant entier : au-delà, on passe par exp(b·ln|a|).
const PUISSANCE_ENTIERE_MAX: i64 = 64;

/* ------------------------ Décimal (scaled -> texte) ------------------------ */

fn pow10(n: usize) -> BigInt {
    BigInt::from(10).pow(n as u32)
}

/// Convertit un entier “scalé” (×10^digits) en texte décimal.
pub fn scaled_to_decimal(mut scaled: BigInt, digits: usize) -> String {
    let neg = scaled.is_negative();
    if neg {
        scaled = -scaled;
    }

    let scale = pow10(digits);
    let int_part = &scaled / &scale;
    let frac_part = &scaled % &scale;

    if digits == 0 {
        return if neg {
            format!("-{int_part}")
        } else {
            format!("{int_part}")
        };
    }

    let mut frac = frac_part.to_str_radix(10);
    while frac.len() < digits {
        frac.insert(0, '0');
    }

    if neg {
        format!("-{int_part}.{frac}")
    } else {
        format!("{int_part}.{frac}")
    }
}

/// r -> entier “scalé” = trunc(r * 10^digits)
fn rational_scaled(r: &BigRational, un: &BigInt) -> BigInt {
    (r.numer() * un) / r.denom()
}

/// a / b arrondi au plus proche (demi : loin de zéro), b > 0.
fn division_arrondie(a: &BigInt, b: &BigInt) -> BigInt {
    let q: BigInt = (a.abs() * 2u32 + b) / (b * 2u32);
    if a.is_negative() {
        -q
    } else {
        q
    }
}

/* ------------------------ Approximation décimale ------------------------ */

/// Approximation décimale : valeur/10^chiffres, arrondie au plus proche.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Approx {
    valeur: BigInt,
    chiffres: usize,
}

impl Approx {
    pub fn depuis_rationnel(r: &BigRational, chiffres: usize) -> Self {
        let valeur = division_arrondie(&(r.numer() * pow10(chiffres)), r.denom());
        Approx { valeur, chiffres }
    }

    /// Valeur exacte de l’approximation (n/10^chiffres).
    pub fn vers_rationnel(&self) -> BigRational {
        BigRational::new(self.valeur.clone(), pow10(self.chiffres))
    }

    /// Pour le tracé uniquement.
    pub fn vers_f64(&self) -> f64 {
        self.to_string().parse::<f64>().unwrap_or(f64::NAN)
    }
}

/// Texte décimal, zéros de queue retirés ("1.500" -> "1.5", "2.000" -> "2").
impl fmt::Display for Approx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let brut = scaled_to_decimal(self.valeur.clone(), self.chiffres);
        let texte = if brut.contains('.') {
            brut.trim_end_matches('0').trim_end_matches('.')
        } else {
            brut.as_str()
        };
        if texte == "-0" {
            write!(f, "0")
        } else {
            write!(f, "{texte}")
        }
    }
}

/* ------------------------ Caches (π, ln 2, ln 10, Bernoulli) ------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Constante {
    Pi,
    Ln2,
    Ln10,
}

static CONSTANTES: OnceLock<Mutex<HashMap<(Constante, usize), BigInt>>> = OnceLock::new();

/// Le verrou n’est pas tenu pendant le calcul : ln 10 a besoin de ln 2.
fn constante_cachee(c: Constante, prec: usize, calcul: impl FnOnce() -> BigInt) -> BigInt {
    let m = CONSTANTES.get_or_init(|| Mutex::new(HashMap::new()));

    {
        let guard = m.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(v) = guard.get(&(c, prec)) {
            return v.clone();
        }
    }

    debug!("cache {c:?} : calcul à {prec} chiffres");
    let v = calcul();
    let mut guard = m.lock().unwrap_or_else(|e| e.into_inner());
    guard.insert((c, prec), v.clone());
    v
}

/// arctan(1/q) en entier scalé (troncature) via série:
/// atan(z) = z - z^3/3 + z^5/5 - ...
fn arctan_inv_q_scaled(q: i64, scale: &BigInt) -> BigInt {
    serie_inverse(q, scale, true)
}

/// atanh(1/q) = z + z^3/3 + z^5/5 + ...
fn atanh_inv_q_scaled(q: i64, scale: &BigInt) -> BigInt {
    serie_inverse(q, scale, false)
}

fn serie_inverse(q: i64, scale: &BigInt, alterne: bool) -> BigInt {
    let q = BigInt::from(q);
    let q2 = &q * &q;

    let mut k: u64 = 0;
    let mut q_pow = q; // q^(2k+1)
    let mut sum = BigInt::zero();

    loop {
        let term = scale / (&q_pow * (2 * k + 1));
        if term.is_zero() {
            break;
        }
        if alterne && k % 2 == 1 {
            sum -= &term;
        } else {
            sum += &term;
        }
        q_pow *= &q2;
        k += 1;
    }

    sum
}

fn pi_scaled_compute(prec: usize) -> BigInt {
    let scale = pow10(prec + GARDE);

    // Machin : π = 16*atan(1/5) - 4*atan(1/239)
    let a = arctan_inv_q_scaled(5, &scale);
    let b = arctan_inv_q_scaled(239, &scale);

    (BigInt::from(16) * a - BigInt::from(4) * b) / pow10(GARDE)
}

fn ln2_scaled_compute(prec: usize) -> BigInt {
    // ln 2 = 2*atanh(1/3)
    let scale = pow10(prec + GARDE);
    (atanh_inv_q_scaled(3, &scale) * 2) / pow10(GARDE)
}

static BERNOULLI: OnceLock<Mutex<Vec<BigRational>>> = OnceLock::new();

/// B_0..B_n (convention B_1 = +1/2, seuls les indices pairs servent).
/// Algorithme d’Akiyama–Tanigawa, exact.
fn bernoulli(n: usize) -> Vec<BigRational> {
    let m = BERNOULLI.get_or_init(|| Mutex::new(Vec::new()));
    let mut guard = m.lock().unwrap_or_else(|e| e.into_inner());

    if guard.len() <= n {
        debug!("cache Bernoulli : B_0..B_{n}");
        let mut a: Vec<BigRational> = Vec::with_capacity(n + 1);
        let mut b: Vec<BigRational> = Vec::with_capacity(n + 1);
        for k in 0..=n {
            a.push(BigRational::new(BigInt::one(), BigInt::from(k + 1)));
            for j in (1..=k).rev() {
                let diff = &a[j - 1] - &a[j];
                a[j - 1] = diff * BigRational::from_integer(BigInt::from(j));
            }
            b.push(a[0].clone());
        }
        *guard = b;
    }

    guard[..=n].to_vec()
}

/* ------------------------ Lecteur ------------------------ */

/// Évaluateur numérique d’une expression exacte.
/// `x` : valeur liée à la variable (tracé), sinon toute Var est refusée.
pub struct Lecteur {
    chiffres: usize,
    prec: usize,
    un: BigInt,
    x: Option<BigInt>,
}

impl Lecteur {
    pub fn new(chiffres: usize) -> Self {
        let prec = chiffres + GARDE;
        Lecteur {
            chiffres,
            prec,
            un: pow10(prec),
            x: None,
        }
    }

    pub fn avec_x(mut self, x: &BigRational) -> Self {
        self.x = Some(rational_scaled(x, &self.un));
        self
    }

    /// Valeur arrondie à `chiffres` décimales.
    pub fn approx(&self, e: &Expr) -> Result<Approx, ErreurCalcul> {
        let v = self.eval(e)?;
        Ok(Approx {
            valeur: division_arrondie(&v, &pow10(GARDE)),
            chiffres: self.chiffres,
        })
    }

    /* ---- arithmétique en virgule fixe ---- */

    fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        (a * b) / &self.un
    }

    fn div(&self, a: &BigInt, b: &BigInt) -> Result<BigInt, ErreurCalcul> {
        if b.is_zero() {
            return Err(ErreurCalcul::DivisionParZero);
        }
        Ok((a * &self.un) / b)
    }

    fn entier(&self, n: i64) -> BigInt {
        &self.un * n
    }

    fn est_entier(&self, v: &BigInt) -> bool {
        (v % &self.un).is_zero()
    }

    fn pi(&self) -> BigInt {
        let prec = self.prec;
        constante_cachee(Constante::Pi, prec, || pi_scaled_compute(prec))
    }

    fn ln2(&self) -> BigInt {
        let prec = self.prec;
        constante_cachee(Constante::Ln2, prec, || ln2_scaled_compute(prec))
    }

    fn ln10(&self) -> BigInt {
        let dix = self.entier(10);
        constante_cachee(Constante::Ln10, self.prec, || {
            self.ln(&dix).unwrap_or_default()
        })
    }

    /* ---- évaluation ---- */

    fn eval(&self, e: &Expr) -> Result<BigInt, ErreurCalcul> {
        use Expr::*;

        match e {
            Indefini => Err(ErreurCalcul::Indefini("valeur indéfinie".into())),

            Var(v) => match (&self.x, v.as_str()) {
                (Some(x), "x") => Ok(x.clone()),
                _ => Err(ErreurCalcul::Domaine(format!("variable '{v}' sans valeur"))),
            },

            Rat(r) => Ok(rational_scaled(r, &self.un)),
            Pi => Ok(self.pi()),
            E => self.exp(&self.un),

            Add(a, b) => Ok(self.eval(a)? + self.eval(b)?),
            Sub(a, b) => Ok(self.eval(a)? - self.eval(b)?),
            Mul(a, b) => borne(self.mul(&self.eval(a)?, &self.eval(b)?)),
            Div(a, b) => {
                let sa = self.eval(a)?;
                let sb = self.eval(b)?;
                self.div(&sa, &sb)
            }

            Sqrt(x) => self.racine(&self.eval(x)?),
            Pow(a, b) => {
                let sa = self.eval(a)?;
                let sb = self.eval(b)?;
                self.puissance(&sa, &sb)
            }

            Appel(f, x) => {
                let v = self.eval(x)?;
                self.fonction(*f, &v)
            }
        }
    }

    fn fonction(&self, f: Fonc, v: &BigInt) -> Result<BigInt, ErreurCalcul> {
        match f {
            Fonc::Abs => Ok(v.abs()),
            Fonc::Floor => Ok(self.plancher(v)),
            Fonc::Ceil => Ok(-self.plancher(&-v)),
            Fonc::Exp => self.exp(v),
            Fonc::Ln => self.ln(v),
            Fonc::Log10 => {
                let l = self.ln(v)?;
                self.div(&l, &self.ln10())
            }
            Fonc::Gamma => self.gamma(v),
            Fonc::Factorielle => {
                if v.is_negative() {
                    return Err(ErreurCalcul::Domaine(
                        "factorielle d’un nombre négatif".into(),
                    ));
                }
                self.gamma(&(v + &self.un))
            }

            Fonc::Sin => Ok(self.sin_cos(v).0),
            Fonc::Cos => Ok(self.sin_cos(v).1),
            Fonc::Tan => {
                let (s, c) = self.sin_cos(v);
                if c.is_zero() {
                    return Err(ErreurCalcul::Indefini("tan".into()));
                }
                self.div(&s, &c)
            }
            Fonc::Asin => self.asin(v),
            Fonc::Acos => Ok(self.pi() / 2 - self.asin(v)?),
            Fonc::Atan => Ok(self.atan(v)),

            Fonc::Sinh => {
                let a = self.exp(v)?;
                let b = self.exp(&-v)?;
                Ok((a - b) / 2)
            }
            Fonc::Cosh => {
                let a = self.exp(v)?;
                let b = self.exp(&-v)?;
                Ok((a + b) / 2)
            }
            Fonc::Tanh => {
                // sign(x)·(1 - e^(-2|x|)) / (1 + e^(-2|x|)) : pas de dépassement
                let t = self.exp(&-(v.abs() * 2u32))?;
                let r = self.div(&(&self.un - &t), &(&self.un + &t))?;
                Ok(if v.is_negative() { -r } else { r })
            }
            Fonc::Asinh => {
                let a = v.abs();
                let r = self.racine(&(self.mul(&a, &a) + &self.un))?;
                let l = self.ln(&(a + r))?;
                Ok(if v.is_negative() { -l } else { l })
            }
            Fonc::Acosh => {
                if v < &self.un {
                    return Err(ErreurCalcul::Domaine("acosh : argument < 1".into()));
                }
                let r = self.racine(&(self.mul(v, v) - &self.un))?;
                self.ln(&(v + r))
            }
            Fonc::Atanh => {
                if v.abs() >= self.un {
                    return Err(ErreurCalcul::Domaine("atanh : |argument| ≥ 1".into()));
                }
                let q = self.div(&(&self.un + v), &(&self.un - v))?;
                Ok(self.ln(&q)? / 2)
            }
        }
    }

    /* ---- fonctions élémentaires ---- */

    fn plancher(&self, v: &BigInt) -> BigInt {
        let mut q = v / &self.un;
        if v.is_negative() && !self.est_entier(v) {
            q -= 1;
        }
        q * &self.un
    }

    fn racine(&self, v: &BigInt) -> Result<BigInt, ErreurCalcul> {
        if v.is_negative() {
            return Err(ErreurCalcul::Domaine("racine carrée d’un nombre négatif".into()));
        }
        Ok((v * &self.un).sqrt())
    }

    fn exp(&self, x: &BigInt) -> Result<BigInt, ErreurCalcul> {
        let limite = self.entier(EXP_MAX);
        if x > &limite {
            return Err(ErreurCalcul::Depassement(format!(
                "exp : argument > {EXP_MAX}"
            )));
        }
        if x < &-limite {
            return Ok(BigInt::zero());
        }

        // x = m·ln2 + r, |r| < ln2 ; puis r/2^8 et 8 élévations au carré
        let ln2 = self.ln2();
        let m = x / &ln2;
        let r: BigInt = (x - &m * &ln2) >> 8u32;

        let mut somme = BigInt::zero();
        let mut terme = self.un.clone();
        let mut n: u64 = 1;
        while !terme.is_zero() {
            somme += &terme;
            terme = self.mul(&terme, &r) / n;
            n += 1;
        }
        for _ in 0..8 {
            somme = self.mul(&somme, &somme);
        }

        let m = m.to_i64().unwrap_or(0);
        Ok(if m >= 0 {
            somme << (m as u64)
        } else {
            somme >> (m.unsigned_abs())
        })
    }

    fn ln(&self, x: &BigInt) -> Result<BigInt, ErreurCalcul> {
        if !x.is_positive() {
            return Err(ErreurCalcul::Domaine("logarithme d’un nombre ≤ 0".into()));
        }

        // x = 2^m·y avec y ≈ 1 ; ln y = 2·atanh((y-1)/(y+1))
        let m = x.bits() as i64 - self.un.bits() as i64;
        let y: BigInt = if m >= 0 {
            x >> (m as u64)
        } else {
            x << (m.unsigned_abs())
        };
        let z = self.div(&(&y - &self.un), &(&y + &self.un))?;
        let z2 = self.mul(&z, &z);

        let mut somme = BigInt::zero();
        let mut puissance = z;
        let mut k: u64 = 0;
        loop {
            let terme = &puissance / (2 * k + 1);
            if terme.is_zero() {
                break;
            }
            somme += terme;
            puissance = self.mul(&puissance, &z2);
            k += 1;
        }

        Ok(somme * 2 + self.ln2() * m)
    }

    /// (sin x, cos x). Réduction modulo 2π avec des chiffres en plus
    /// pour la partie entière de x.
    fn sin_cos(&self, x: &BigInt) -> (BigInt, BigInt) {
        let partie_entiere = (x.abs() / &self.un).to_str_radix(10).len();
        let prec2 = self.prec + partie_entiere;
        let un2 = pow10(prec2);
        let decalage = pow10(partie_entiere);

        let pi2 = constante_cachee(Constante::Pi, prec2, || pi_scaled_compute(prec2));
        let deux_pi: BigInt = &pi2 * 2u32;

        let mut r: BigInt = (x * &decalage) % &deux_pi;
        if r.is_negative() {
            r += &deux_pi;
        }
        if r > pi2 {
            r -= &deux_pi;
        }

        let r2 = (&r * &r) / &un2;

        let mut sin = BigInt::zero();
        let mut terme = r;
        let mut n: u64 = 1;
        while !terme.is_zero() {
            sin += &terme;
            terme = -((&terme * &r2) / &un2) / ((n + 1) * (n + 2));
            n += 2;
        }

        let mut cos = BigInt::zero();
        let mut terme = un2.clone();
        let mut n: u64 = 0;
        while !terme.is_zero() {
            cos += &terme;
            terme = -((&terme * &r2) / &un2) / ((n + 1) * (n + 2));
            n += 2;
        }

        (sin / &decalage, cos / &decalage)
    }

    fn atan(&self, x: &BigInt) -> BigInt {
        if x.is_zero() {
            return BigInt::zero();
        }
        if x.abs() > self.un {
            // atan(x) = ±π/2 - atan(1/x)
            let inv = (&self.un * &self.un) / x;
            let demi_pi: BigInt = self.pi() / 2u32;
            let a = self.atan(&inv);
            return if x.is_negative() {
                -demi_pi - a
            } else {
                demi_pi - a
            };
        }

        // atan(x) = 2·atan(x / (1 + √(1+x²))), deux fois => |y| ≤ tan(π/16)
        let mut y = x.clone();
        for _ in 0..2 {
            let r = ((&self.un + self.mul(&y, &y)) * &self.un).sqrt();
            y = (&y * &self.un) / (&self.un + r);
        }

        let y2 = self.mul(&y, &y);
        let mut somme = BigInt::zero();
        let mut puissance = y;
        let mut k: u64 = 0;
        loop {
            let terme = &puissance / (2 * k + 1);
            if terme.is_zero() {
                break;
            }
            if k % 2 == 0 {
                somme += terme;
            } else {
                somme -= terme;
            }
            puissance = self.mul(&puissance, &y2);
            k += 1;
        }

        somme * 4
    }

    fn asin(&self, x: &BigInt) -> Result<BigInt, ErreurCalcul> {
        if x.abs() > self.un {
            return Err(ErreurCalcul::Domaine("asin/acos : |argument| > 1".into()));
        }
        if x.abs() == self.un {
            let demi_pi: BigInt = self.pi() / 2u32;
            return Ok(if x.is_negative() { -demi_pi } else { demi_pi });
        }
        let c = self.racine(&(&self.un - self.mul(x, x)))?;
        let t = self.div(x, &c)?;
        Ok(self.atan(&t))
    }

    fn puissance(&self, a: &BigInt, b: &BigInt) -> Result<BigInt, ErreurCalcul> {
        let b_entier = self.est_entier(b);

        if a.is_zero() {
            return if b.is_positive() {
                Ok(BigInt::zero())
            } else if b.is_zero() {
                Ok(self.un.clone())
            } else {
                Err(ErreurCalcul::DivisionParZero)
            };
        }

        if b_entier {
            let k = b / &self.un;
            if let Some(k) = k.to_i64().filter(|k| k.abs() <= PUISSANCE_ENTIERE_MAX) {
                let mut acc = self.un.clone();
                let mut base = a.clone();
                let mut e = k.unsigned_abs();
                while e > 0 {
                    if e & 1 == 1 {
                        acc = borne(self.mul(&acc, &base))?;
                    }
                    e >>= 1;
                    if e > 0 {
                        base = borne(self.mul(&base, &base))?;
                    }
                }
                return if k < 0 {
                    let un = self.un.clone();
                    self.div(&un, &acc)
                } else {
                    Ok(acc)
                };
            }

            let impair = !(&k % 2u32).is_zero();
            let v = self.exp(&self.mul(b, &self.ln(&a.abs())?))?;
            return Ok(if a.is_negative() && impair { -v } else { v });
        }

        if a.is_negative() {
            return Err(ErreurCalcul::Domaine(
                "puissance non entière d’un nombre négatif".into(),
            ));
        }
        self.exp(&self.mul(b, &self.ln(a)?))
    }

    fn gamma(&self, x: &BigInt) -> Result<BigInt, ErreurCalcul> {
        if self.est_entier(x) && !x.is_positive() {
            return Err(ErreurCalcul::Domaine(format!(
                "gamma : pôle en {}",
                x / &self.un
            )));
        }

        // réflexion : Γ(x) = π / (sin(πx)·Γ(1-x))
        if x < &(&self.un / 2) {
            let pi = self.pi();
            let (s, _) = self.sin_cos(&self.mul(&pi, x));
            let g = self.gamma(&(&self.un - x))?;
            return self.div(&pi, &self.mul(&s, &g));
        }

        // décalage : Γ(x) = Γ(x+n) / (x(x+1)…(x+n-1)), x+n ≥ prec
        let cible = self.entier(self.prec as i64);
        let mut z = x.clone();
        let mut produit = self.un.clone();
        while z < cible {
            produit = borne(self.mul(&produit, &z))?;
            z += &self.un;
        }

        let lg = self.ln_gamma_stirling(&z)?;
        let g = self.exp(&lg)?;
        self.div(&g, &produit)
    }

    /// ln Γ(z) = (z-½)ln z - z + ½ln(2π) + Σ B_2k / (2k(2k-1) z^(2k-1)), z ≥ prec
    fn ln_gamma_stirling(&self, z: &BigInt) -> Result<BigInt, ErreurCalcul> {
        let demi = &self.un / 2;
        let lz = self.ln(z)?;
        let ln_2pi = self.ln(&(self.pi() * 2))?;

        let mut somme = self.mul(&(z - &demi), &lz) - z + ln_2pi / 2;

        let termes = self.prec / 2 + 2;
        let b = bernoulli(2 * termes);

        let inv = self.div(&self.un, z)?;
        let inv2 = self.mul(&inv, &inv);
        let mut puissance = inv;
        for k in 1..=termes {
            let c = &b[2 * k] / BigRational::from_integer(BigInt::from(2 * k * (2 * k - 1)));
            somme += (&puissance * c.numer()) / c.denom();
            puissance = self.mul(&puissance, &inv2);
        }

        Ok(somme)
    }
}

fn borne(v: BigInt) -> Result<BigInt, ErreurCalcul> {
    if v.bits() > MAX_BITS {
        Err(ErreurCalcul::Depassement("valeur trop grande".into()))
    } else {
        Ok(v)
    }
}

/// Approximation d’une expression close à `chiffres` décimales.
pub fn approximer(e: &Expr, chiffres: usize) -> Result<Approx, ErreurCalcul> {
    Lecteur::new(chiffres).approx(e)
}
