// src/noyau/format.rs

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::expr::{Expr, Fonc};

/* ------------------------ Helpers rationnels ------------------------ */

fn format_rat_pretty(r: &BigRational) -> String {
    let n = r.numer();
    let d = r.denom();
    if d.is_one() {
        format!("{n}")
    } else {
        format!("{n}/{d}")
    }
}

fn format_sqrt_of_int(n: &BigInt) -> String {
    format!("√{n}")
}

/// (p/q)*√n -> p√n/q ; √n/q si p=1 ; -√n/q si p=-1
fn format_mul_rat_sqrt(r: &BigRational, n: &BigInt) -> String {
    let p = r.numer();
    let q = r.denom();

    if p.is_zero() {
        return "0".to_string();
    }

    let tete = if p.is_one() {
        String::new()
    } else if p == &BigInt::from(-1) {
        "-".to_string()
    } else {
        format!("{p}")
    };

    if q.is_one() {
        format!("{tete}{}", format_sqrt_of_int(n))
    } else {
        format!("{tete}{}/{q}", format_sqrt_of_int(n))
    }
}

/// Tente de reconnaître √(entier) et renvoie cet entier (n) si oui.
fn as_sqrt_of_int(e: &Expr) -> Option<&BigInt> {
    if let Expr::Sqrt(inner) = e {
        if let Expr::Rat(r) = inner.as_ref() {
            if r.denom().is_one() {
                return Some(r.numer());
            }
        }
    }
    None
}

/// Tente de reconnaître (Rat r) * √(entier) ou √(entier) * (Rat r).
fn as_mul_rat_sqrt(e: &Expr) -> Option<(&BigRational, &BigInt)> {
    if let Expr::Mul(a, b) = e {
        if let (Expr::Rat(r), Some(n)) = (a.as_ref(), as_sqrt_of_int(b)) {
            return Some((r, n));
        }
        if let (Some(n), Expr::Rat(r)) = (as_sqrt_of_int(a), b.as_ref()) {
            return Some((r, n));
        }
    }
    None
}

fn is_zero_expr(e: &Expr) -> bool {
    matches!(e, Expr::Rat(r) if r.is_zero())
}

fn needs_parens_for_unary_minus(e: &Expr) -> bool {
    matches!(e, Expr::Add(_, _) | Expr::Sub(_, _))
}

/// Atome visuel : pas besoin de parenthèses autour (base/exposant d’une puissance).
fn est_atome(e: &Expr) -> bool {
    match e {
        Expr::Rat(r) => r.denom().is_one() && !r.is_negative(),
        Expr::Pi | Expr::E | Expr::Var(_) | Expr::Sqrt(_) | Expr::Appel(_, _) => true,
        _ => false,
    }
}

/* ------------------------ π “joli” ------------------------ */

/// coeff*π : affichage joli (π/2, 3π/2, -2π, etc.)
pub fn format_coeff_pi(coeff: &BigRational) -> String {
    let n = coeff.numer();
    let d = coeff.denom();

    if coeff.is_zero() {
        return "0".to_string();
    }

    let tete = if n.is_one() {
        "π".to_string()
    } else if n == &BigInt::from(-1) {
        "-π".to_string()
    } else {
        format!("{n}π")
    };

    if d.is_one() {
        tete
    } else {
        format!("{tete}/{d}")
    }
}

/* ------------------------ Affichage EXACT “joli” ------------------------ */

/// Formate l’expression EXACT, en privilégiant une sortie lisible:
/// - √2/2, √3/3, -√2/2, etc.
/// - π/6, 3π/2 dès qu’un sous-arbre est un coeff·π
/// - évite les parenthèses lourdes quand possible
pub fn format_expr_pretty(e: &Expr) -> String {
    use Expr::*;

    match e {
        Indefini => "indéfini".to_string(),

        Rat(r) => format_rat_pretty(r),
        Pi => "π".to_string(),
        E => "e".to_string(),
        Var(s) => s.clone(),

        // √2, √3, etc. si argument entier
        Sqrt(x) => match x.as_ref() {
            Rat(r) if r.denom().is_one() => format_sqrt_of_int(r.numer()),
            Pi => "√π".to_string(),
            _ => format!("√({})", format_expr_pretty(x)),
        },

        Pow(a, b) => {
            let sa = format_expr_pretty(a);
            let sb = format_expr_pretty(b);
            let sa = if est_atome(a) { sa } else { format!("({sa})") };
            let sb = if est_atome(b) { sb } else { format!("({sb})") };
            format!("{sa}^{sb}")
        }

        Appel(Fonc::Abs, x) => format!("|{}|", format_expr_pretty(x)),
        Appel(f, x) => format!("{}({})", f.nom(), format_expr_pretty(x)),

        // cas joli : (p/q)*√n => p√n/q (donc √2/2, √3/3, etc.)
        Mul(a, b) => {
            if let Some(c) = e.as_coeff_pi_ext() {
                return format_coeff_pi(&c);
            }
            if let Some((r, n)) = as_mul_rat_sqrt(e) {
                return format_mul_rat_sqrt(r, n);
            }
            format!("({}*{})", format_expr_pretty(a), format_expr_pretty(b))
        }

        // a/b : on renforce les cas “√.../k” et “(p/q)*√.../k”
        Div(a, b) => {
            if let Some(c) = e.as_coeff_pi_ext() {
                return format_coeff_pi(&c);
            }

            // denom entier simple ?
            if let Rat(rden) = b.as_ref() {
                if rden.denom().is_one() {
                    let k = rden.numer();

                    // √n / k  -> √n/k
                    if let Some(n) = as_sqrt_of_int(a) {
                        return format!("{}/{}", format_sqrt_of_int(n), k);
                    }

                    // ((p/q)*√n) / k -> (p/qk)*√n -> p√n/(qk)
                    if let Some((r, n)) = as_mul_rat_sqrt(a) {
                        let rk = r / BigRational::from_integer(k.clone());
                        return format_mul_rat_sqrt(&rk, n);
                    }

                    return format!("{}/{}", format_expr_pretty(a), k);
                }
            }

            format!("{}/{}", format_expr_pretty(a), format_expr_pretty(b))
        }

        Add(a, b) => format!("({}+{})", format_expr_pretty(a), format_expr_pretty(b)),

        // 0 - x => -x (rendu propre), sinon affichage normal
        Sub(a, b) => {
            if is_zero_expr(a) {
                let sb = format_expr_pretty(b);
                if needs_parens_for_unary_minus(b) {
                    format!("-({sb})")
                } else {
                    format!("-{sb}")
                }
            } else {
                format!("({}-{})", format_expr_pretty(a), format_expr_pretty(b))
            }
        }
    }
}

/// EXACT final : parenthèses extérieures retirées (lecture plus légère).
pub fn format_exact_final(expr_simplifie: &Expr) -> String {
    let s = format_expr_pretty(expr_simplifie);
    retire_parentheses_exterieures(&s).to_string()
}

/// "(a+b)" -> "a+b" seulement si la paire extérieure se correspond.
fn retire_parentheses_exterieures(s: &str) -> &str {
    let Some(interieur) = s.strip_prefix('(').and_then(|t| t.strip_suffix(')')) else {
        return s;
    };
    let mut profondeur: i32 = 0;
    for c in interieur.chars() {
        match c {
            '(' => profondeur += 1,
            ')' => {
                profondeur -= 1;
                if profondeur < 0 {
                    return s;
                }
            }
            _ => {}
        }
    }
    if profondeur == 0 {
        interieur
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::expr::{appel, div, entier, mul, oppose};

    #[test]
    fn racines_jolies() {
        let e = div(Expr::Sqrt(Box::new(entier(2))), entier(2));
        assert_eq!(format_expr_pretty(&e), "√2/2");

        let e = mul(
            Expr::Rat(BigRational::new(BigInt::from(2), BigInt::from(3))),
            Expr::Sqrt(Box::new(entier(3))),
        );
        assert_eq!(format_expr_pretty(&e), "2√3/3");
    }

    #[test]
    fn coeff_pi_joli() {
        assert_eq!(format_expr_pretty(&div(Expr::Pi, entier(2))), "π/2");
        assert_eq!(format_expr_pretty(&mul(entier(-3), Expr::Pi)), "-3π");
        assert_eq!(format_coeff_pi(&BigRational::new(BigInt::from(3), BigInt::from(2))), "3π/2");
    }

    #[test]
    fn puissances_et_appels() {
        let x = Expr::Var("x".into());
        let e = Expr::Add(
            Box::new(Expr::Pow(Box::new(x.clone()), Box::new(entier(2)))),
            Box::new(entier(1)),
        );
        assert_eq!(format_exact_final(&e), "x^2+1");
        assert_eq!(format_expr_pretty(&appel(Fonc::Abs, x.clone())), "|x|");
        assert_eq!(format_expr_pretty(&oppose(appel(Fonc::Ln, x))), "-ln(x)");
    }

    #[test]
    fn parentheses_exterieures_seulement_si_appariees() {
        assert_eq!(retire_parentheses_exterieures("(a)+(b)"), "(a)+(b)");
        assert_eq!(retire_parentheses_exterieures("((a)+(b))"), "(a)+(b)");
    }
}
