// src/noyau/jetons.rs

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Pow};

use super::erreur::ErreurCalcul;

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Num(BigRational),

    // Fonctions, constantes, variable : la table des symboles décidera.
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Puissance, // **
    Neg,       // moins unaire (posé par le shunting-yard, jamais par tokenize)

    LPar,
    RPar,
}

/// Tokenize une chaîne (déjà normalisée) en jetons.
/// Supporte:
/// - entiers et décimaux (ex: 12, 2.5, .5) -> rationnels exacts (2.5 = 5/2)
/// - opérateurs + - * / **
/// - parenthèses ( )
/// - π (équivaut à ident("pi"))
/// - identifiants [a-zA-Z_][a-zA-Z0-9_]* (normalisés en minuscules)
/// - √ (équivaut à ident("sqrt")) ; √12 est lu comme sqrt(12)
pub fn tokenize(s: &str) -> Result<Vec<Tok>, ErreurCalcul> {
    let mut out = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut i: usize = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '(' => {
                out.push(Tok::LPar);
                i += 1;
                continue;
            }
            ')' => {
                out.push(Tok::RPar);
                i += 1;
                continue;
            }
            '+' => {
                out.push(Tok::Plus);
                i += 1;
                continue;
            }
            '-' => {
                out.push(Tok::Minus);
                i += 1;
                continue;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    out.push(Tok::Puissance);
                    i += 2;
                } else {
                    out.push(Tok::Star);
                    i += 1;
                }
                continue;
            }
            '/' => {
                out.push(Tok::Slash);
                i += 1;
                continue;
            }
            'π' => {
                out.push(Tok::Ident("pi".to_string()));
                i += 1;
                continue;
            }
            _ => {}
        }

        // Racine carrée unicode : √  => ident("sqrt")
        if c == '√' {
            out.push(Tok::Ident("sqrt".to_string()));
            i += 1;

            // √ suivi directement d’un nombre : on l’entoure de parenthèses
            if i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                let (rat, suivant) = lire_nombre(&chars, i)?;
                out.push(Tok::LPar);
                out.push(Tok::Num(rat));
                out.push(Tok::RPar);
                i = suivant;
            }
            continue;
        }

        // Identifiants ASCII : [a-zA-Z_][a-zA-Z0-9_]*
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            out.push(Tok::Ident(word.to_lowercase()));
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let (rat, suivant) = lire_nombre(&chars, i)?;
            out.push(Tok::Num(rat));
            i = suivant;
            continue;
        }

        return Err(ErreurCalcul::Syntaxe(format!("caractère inattendu: '{c}'")));
    }

    Ok(out)
}

/// Lit un littéral décimal à partir de `start` ; renvoie (valeur exacte, index suivant).
fn lire_nombre(chars: &[char], start: usize) -> Result<(BigRational, usize), ErreurCalcul> {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let entiere: String = chars[start..i].iter().collect();

    let mut fraction = String::new();
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        let debut = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        fraction = chars[debut..i].iter().collect();
        if i < chars.len() && chars[i] == '.' {
            return Err(ErreurCalcul::Syntaxe("nombre invalide (deux points décimaux)".into()));
        }
    }

    if entiere.is_empty() && fraction.is_empty() {
        return Err(ErreurCalcul::Syntaxe("nombre invalide: '.'".into()));
    }

    let chiffres = format!("{entiere}{fraction}");
    let n = BigInt::parse_bytes(chiffres.as_bytes(), 10)
        .ok_or_else(|| ErreurCalcul::Syntaxe(format!("nombre invalide: '{chiffres}'")))?;
    let d: BigInt = if fraction.is_empty() {
        BigInt::one()
    } else {
        BigInt::from(10).pow(fraction.len() as u32)
    };

    Ok((BigRational::new(n, d), i))
}

/// Format utilitaire (debug/“démarche”) : liste de jetons en texte.
pub fn format_tokens(tokens: &[Tok]) -> String {
    let mut out = Vec::with_capacity(tokens.len());
    for t in tokens {
        let s = match t {
            Tok::Num(r) => {
                if r.denom().is_one() {
                    format!("{}", r.numer())
                } else {
                    format!("{}/{}", r.numer(), r.denom())
                }
            }
            Tok::Ident(name) => name.clone(),

            Tok::Plus => "+".to_string(),
            Tok::Minus => "-".to_string(),
            Tok::Star => "*".to_string(),
            Tok::Slash => "/".to_string(),
            Tok::Puissance => "**".to_string(),
            Tok::Neg => "neg".to_string(),

            Tok::LPar => "(".to_string(),
            Tok::RPar => ")".to_string(),
        };
        out.push(s);
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64, d: i64) -> Tok {
        Tok::Num(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    #[test]
    fn decimaux_exacts() {
        assert_eq!(tokenize("2.5").unwrap(), vec![num(5, 2)]);
        assert_eq!(tokenize(".25").unwrap(), vec![num(1, 4)]);
        assert_eq!(tokenize("3.").unwrap(), vec![num(3, 1)]);
    }

    #[test]
    fn puissance_double_etoile() {
        let t = tokenize("2**3*4").unwrap();
        assert_eq!(t, vec![num(2, 1), Tok::Puissance, num(3, 1), Tok::Star, num(4, 1)]);
    }

    #[test]
    fn glyphes_pi_et_racine() {
        let t = tokenize("√2+π").unwrap();
        assert_eq!(format_tokens(&t), "sqrt ( 2 ) + pi");
    }

    #[test]
    fn identifiants_en_minuscules() {
        assert_eq!(
            tokenize("SIN(X)").unwrap(),
            vec![
                Tok::Ident("sin".into()),
                Tok::LPar,
                Tok::Ident("x".into()),
                Tok::RPar
            ]
        );
    }

    #[test]
    fn caracteres_refuses() {
        assert!(matches!(tokenize("5!"), Err(ErreurCalcul::Syntaxe(_))));
        assert!(matches!(tokenize("1.2.3"), Err(ErreurCalcul::Syntaxe(_))));
        assert!(matches!(tokenize("2^3"), Err(ErreurCalcul::Syntaxe(_))));
    }
}
