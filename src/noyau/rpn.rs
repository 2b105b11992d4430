// src/noyau/rpn.rs
//
// Shunting-yard -> RPN -> AST
// Objectif:
// - Convertir une suite de Tok en RPN (postfix)
// - Puis reconstruire Expr à partir de la table des symboles
//
// Règles:
// - Ident(name):
//    - liaison Fonction => fonction unaire, doit être suivie de '('
//    - liaison Variable/Constante => atome
// - Moins unaire:
//    - '-' quand on n’attend PAS une valeur => Tok::Neg (préfixe)
//    - priorité : + - < * / < neg < **   (donc -2**2 = -(2**2), 2*-3 = 2*(-3))
//
// NOTE:
// - Les fonctions sont traitées comme des opérateurs “collés” à leur argument
//   et sont sorties après la parenthèse fermante.

use super::erreur::ErreurCalcul;
use super::expr::{oppose, Expr};
use super::jetons::{format_tokens, Tok};
use super::symboles::{Liaison, TableSymboles};

fn precedence(t: &Tok) -> i32 {
    match t {
        Tok::Plus | Tok::Minus => 1,
        Tok::Star | Tok::Slash => 2,
        Tok::Neg => 3,
        Tok::Puissance => 4,
        _ => 0,
    }
}

fn is_right_associative(t: &Tok) -> bool {
    matches!(t, Tok::Puissance)
}

/// Convertit une suite de jetons en RPN (notation polonaise inversée).
///
/// Exemple:
///   tokens: [Ident("sin"), LPar, Ident("pi"), Slash, Num(2), RPar]
///   rpn:    [Ident("pi"), Num(2), Slash, Ident("sin")]
pub fn to_rpn(tokens: &[Tok], table: &TableSymboles) -> Result<Vec<Tok>, ErreurCalcul> {
    let mut out: Vec<Tok> = Vec::new();
    let mut ops: Vec<Tok> = Vec::new();

    // “valeur” = un atome ou une expression fermée.
    // Sert à détecter le moins unaire.
    let mut prev_was_value = false;

    let est_fonction = |t: &Tok| matches!(t, Tok::Ident(name) if table.est_fonction(name));

    for (i, tok) in tokens.iter().cloned().enumerate() {
        match tok {
            Tok::Num(_) => {
                out.push(tok);
                prev_was_value = true;
            }

            Tok::Ident(name) => {
                if table.est_fonction(&name) {
                    if !matches!(tokens.get(i + 1), Some(Tok::LPar)) {
                        return Err(ErreurCalcul::Syntaxe(format!(
                            "'{name}' doit être suivi de '('"
                        )));
                    }
                    // fonction : on la garde sur la pile (elle sortira après son argument)
                    ops.push(Tok::Ident(name));
                    prev_was_value = false;
                } else {
                    // variable/constante : sortie directe
                    out.push(Tok::Ident(name));
                    prev_was_value = true;
                }
            }

            Tok::LPar => {
                ops.push(tok);
                prev_was_value = false;
            }

            Tok::RPar => {
                // dépile jusqu’à '('
                let mut ouverte = false;
                while let Some(top) = ops.pop() {
                    if matches!(top, Tok::LPar) {
                        ouverte = true;
                        break;
                    }
                    out.push(top);
                }
                if !ouverte {
                    return Err(ErreurCalcul::Syntaxe("')' sans '(' correspondante".into()));
                }

                // si une fonction est au sommet, on la sort aussi
                if ops.last().is_some_and(est_fonction) {
                    if let Some(f) = ops.pop() {
                        out.push(f);
                    }
                }

                prev_was_value = true;
            }

            Tok::Minus if !prev_was_value => {
                // préfixe : ne dépile rien
                ops.push(Tok::Neg);
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Puissance => {
                if !prev_was_value {
                    return Err(ErreurCalcul::Syntaxe(format!(
                        "opérateur '{}' sans opérande à gauche",
                        format_tokens(std::slice::from_ref(&tok))
                    )));
                }

                // dépile tant que:
                // - on n'est pas bloqué par '('
                // - et on ne traverse pas une fonction (fonction reste collée à son argument)
                // - et la précédence/associativité exige de sortir l'opérateur du haut
                while let Some(top) = ops.last() {
                    if matches!(top, Tok::LPar) || est_fonction(top) {
                        break;
                    }

                    let p_top = precedence(top);
                    let p_tok = precedence(&tok);

                    let doit_pop = if is_right_associative(&tok) {
                        p_top > p_tok
                    } else {
                        p_top >= p_tok
                    };

                    if !doit_pop {
                        break;
                    }
                    if let Some(op) = ops.pop() {
                        out.push(op);
                    }
                }

                ops.push(tok);
                prev_was_value = false;
            }

            Tok::Neg => {
                return Err(ErreurCalcul::Syntaxe("jeton 'neg' inattendu".into()));
            }
        }
    }

    // vide la pile ops
    while let Some(op) = ops.pop() {
        if matches!(op, Tok::LPar) {
            return Err(ErreurCalcul::Syntaxe("parenthèses non fermées".into()));
        }
        out.push(op);
    }

    Ok(out)
}

/// Construit une Expr à partir d’une RPN, en résolvant chaque identifiant
/// par la table (Variable => Var, Constante => valeur, Fonction => appel).
pub fn from_rpn(rpn: &[Tok], table: &TableSymboles) -> Result<Expr, ErreurCalcul> {
    let invalide = || ErreurCalcul::Syntaxe("expression invalide".into());
    let mut st: Vec<Expr> = Vec::new();

    for tok in rpn.iter().cloned() {
        match tok {
            Tok::Num(r) => st.push(Expr::Rat(r)),

            Tok::Neg => {
                let x = st.pop().ok_or_else(invalide)?;
                st.push(oppose(x));
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Puissance => {
                let b = Box::new(st.pop().ok_or_else(invalide)?);
                let a = Box::new(st.pop().ok_or_else(invalide)?);

                st.push(match tok {
                    Tok::Plus => Expr::Add(a, b),
                    Tok::Minus => Expr::Sub(a, b),
                    Tok::Star => Expr::Mul(a, b),
                    Tok::Slash => Expr::Div(a, b),
                    _ => Expr::Pow(a, b),
                });
            }

            Tok::Ident(name) => match table.resoudre(&name)? {
                Liaison::Variable => st.push(Expr::Var(name)),
                Liaison::Constante(c) => st.push(c.clone()),
                Liaison::Fonction(f) => {
                    let x = st.pop().ok_or_else(|| {
                        ErreurCalcul::Syntaxe(format!("{name} : fonction sans argument"))
                    })?;
                    st.push(f(x));
                }
            },

            Tok::LPar | Tok::RPar => {
                return Err(ErreurCalcul::Syntaxe("parenthèse inattendue en RPN".into()))
            }
        }
    }

    match (st.pop(), st.is_empty()) {
        (Some(e), true) => Ok(e),
        _ => Err(invalide()),
    }
}
