//! Noyau — évaluation (pipeline réel)
//!
//! normaliser -> tokenize -> contrôle des identifiants -> RPN -> Expr -> simplify
//!        -> trig spéciale (récursive) -> re-simplify -> classement (Numerique / Symbolique / Erreur)
//!
//! Remarque : trig spéciale est appliquée ici (pas dans Expr::simplify),
//! pour garder la “preuve” hors de l’AST.

use log::debug;

use super::erreur::ErreurCalcul;
use super::expr::Expr;
use super::format::{format_exact_final, format_expr_pretty};
use super::jetons::{format_tokens, tokenize, Tok};
use super::lecture::{approximer, Approx};
use super::normalisation::normaliser;
use super::rpn::{from_rpn, to_rpn};
use super::symboles::{ModeAngle, TableSymboles};
// trig_special + preuve
use super::trig::{trig_special, TrigOutcome};

/// Résultat d’une évaluation : exactement un des trois cas.
#[derive(Clone, Debug, PartialEq)]
pub enum Resultat {
    Numerique { exact: Expr, approx: Approx },
    Symbolique { expr: Expr, variables: Vec<String> },
    Erreur(ErreurCalcul),
}

impl Resultat {
    /// Texte affiché et historisé.
    pub fn texte(&self) -> String {
        match self {
            Resultat::Numerique { approx, .. } => approx.to_string(),
            Resultat::Symbolique { expr, .. } => format_exact_final(expr),
            Resultat::Erreur(e) => e.to_string(),
        }
    }

    /// Forme exacte “jolie” (√2/2, π/6…), si le résultat en a une.
    pub fn exact(&self) -> Option<String> {
        match self {
            Resultat::Numerique { exact, .. } => Some(format_exact_final(exact)),
            Resultat::Symbolique { expr, .. } => Some(format_exact_final(expr)),
            Resultat::Erreur(_) => None,
        }
    }

    pub fn est_erreur(&self) -> bool {
        matches!(self, Resultat::Erreur(_))
    }
}

#[derive(Default, Clone, Debug)]
pub struct Demarche {
    pub normalise: String,
    pub jetons: String,
    pub rpn: String,
    pub avant: String,
    pub apres: String,
    pub preuve: String,
}

/// Évalue un texte brut (normalisation comprise), sans registre `ans`.
pub fn evaluer(texte: &str, mode: ModeAngle, chiffres: usize) -> (Resultat, Demarche) {
    evaluer_normalise(&normaliser(texte), mode, chiffres)
}

/// Évalue un texte déjà normalisé (et dont `ans` a été substitué).
/// Toute erreur devient `Resultat::Erreur` : rien ne remonte.
pub fn evaluer_normalise(texte: &str, mode: ModeAngle, chiffres: usize) -> (Resultat, Demarche) {
    let mut demarche = Demarche {
        normalise: texte.to_string(),
        ..Demarche::default()
    };

    let resultat = match analyser(texte, mode, &mut demarche) {
        Ok(expr) => classer(expr, chiffres, &demarche.preuve),
        Err(e) => Resultat::Erreur(e),
    };

    debug!("évaluation [{mode}] {texte:?} -> {}", resultat.texte());
    (resultat, demarche)
}

/// Texte -> Expr simplifiée (trig spéciale comprise). Remplit la démarche au fil de l’eau.
fn analyser(texte: &str, mode: ModeAngle, d: &mut Demarche) -> Result<Expr, ErreurCalcul> {
    let s = texte.trim();
    if s.is_empty() {
        return Err(ErreurCalcul::EntreeVide);
    }

    let table = TableSymboles::pour_mode(mode);
    debug!("table {} : {} noms", table.mode(), table.noms().count());

    // 1) Jetons
    let jetons = tokenize(s)?;
    d.jetons = format_tokens(&jetons);

    // 2) Identifiants : tous connus, avant toute analyse
    for t in &jetons {
        if let Tok::Ident(nom) = t {
            table.resoudre(nom)?;
        }
    }

    // 3) RPN
    let rpn = to_rpn(&jetons, &table)?;
    d.rpn = format_tokens(&rpn);

    // 4) AST (Expr)
    let expr0 = from_rpn(&rpn, &table)?;
    d.avant = format_expr_pretty(&expr0);

    // 5) Simplification de base
    let expr_s0 = expr0.simplify();

    // 6) Trig spéciale (récursive) : remplace dès que possible + accumule preuve
    let mut preuve = String::new();
    let expr_s1 = applique_trig_speciale(&expr_s0, &mut preuve);
    d.preuve = preuve;

    // 7) Re-simplify (important : après remplacements trig)
    let expr = expr_s1.simplify();
    d.apres = format_expr_pretty(&expr);

    Ok(expr)
}

/// Variable libre => Symbolique ; sinon lecture numérique.
fn classer(expr: Expr, chiffres: usize, preuve: &str) -> Resultat {
    if matches!(expr, Expr::Indefini) {
        let motif = preuve
            .lines()
            .rev()
            .find(|l| l.contains("indéfini"))
            .unwrap_or("valeur indéfinie");
        return Resultat::Erreur(ErreurCalcul::Indefini(motif.to_string()));
    }

    let variables = expr.variables_libres();
    if !variables.is_empty() {
        return match verifier_constantes(&expr, chiffres) {
            Ok(()) => Resultat::Symbolique { expr, variables },
            Err(e) => Resultat::Erreur(e),
        };
    }

    match approximer(&expr, chiffres) {
        Ok(approx) => Resultat::Numerique {
            exact: expr.simplify_apres_lecture(),
            approx,
        },
        Err(e) => Resultat::Erreur(e),
    }
}

/// Lit chaque sous-arbre maximal sans variable : 1/0 + x est une erreur,
/// pas une courbe.
fn verifier_constantes(expr: &Expr, chiffres: usize) -> Result<(), ErreurCalcul> {
    let mut constantes = Vec::new();
    collecter_constantes(expr, &mut constantes);
    for c in constantes.into_iter().filter(|c| !c.est_defini()) {
        approximer(c, chiffres)?;
    }
    Ok(())
}

/// Vrai si `e` contient une variable. Les sous-arbres constants voisins
/// d’une variable sont poussés dans `out`.
fn collecter_constantes<'a>(e: &'a Expr, out: &mut Vec<&'a Expr>) -> bool {
    use Expr::*;
    match e {
        Var(_) => true,
        Rat(_) | Pi | E | Indefini => false,
        Sqrt(u) | Appel(_, u) => collecter_constantes(u, out),
        Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Pow(a, b) => {
            let va = collecter_constantes(a, out);
            let vb = collecter_constantes(b, out);
            match (va, vb) {
                (true, false) => out.push(b),
                (false, true) => out.push(a),
                _ => {}
            }
            va || vb
        }
    }
}

/// Trig spéciale récursive : applique trig_special PARTOUT dans l’arbre.
/// Accumule la preuve (une ligne par match trig réussi) dans `preuve`.
fn applique_trig_speciale(expr: &Expr, preuve: &mut String) -> Expr {
    use Expr::*;

    fn push_preuve(preuve: &mut String, ligne: &str) {
        if ligne.is_empty() {
            return;
        }
        if !preuve.is_empty() {
            preuve.push('\n');
        }
        preuve.push_str(ligne);
    }

    let out = match expr {
        // --- appel : trig au noeud courant, sinon descente ---
        Appel(f, x) => {
            let xx = applique_trig_speciale(x, preuve).simplify();
            match trig_special(&xx, *f) {
                Some(TrigOutcome::Valeur(v, p)) => {
                    push_preuve(preuve, &p);
                    v
                }
                Some(TrigOutcome::Indefini(p)) => {
                    push_preuve(preuve, &p);
                    Indefini
                }
                None => Appel(*f, Box::new(xx)),
            }
        }

        // --- descente structurée ---
        Add(a, b) => Add(
            Box::new(applique_trig_speciale(a, preuve)),
            Box::new(applique_trig_speciale(b, preuve)),
        ),
        Sub(a, b) => Sub(
            Box::new(applique_trig_speciale(a, preuve)),
            Box::new(applique_trig_speciale(b, preuve)),
        ),
        Mul(a, b) => Mul(
            Box::new(applique_trig_speciale(a, preuve)),
            Box::new(applique_trig_speciale(b, preuve)),
        ),
        Div(a, b) => Div(
            Box::new(applique_trig_speciale(a, preuve)),
            Box::new(applique_trig_speciale(b, preuve)),
        ),
        Pow(a, b) => Pow(
            Box::new(applique_trig_speciale(a, preuve)),
            Box::new(applique_trig_speciale(b, preuve)),
        ),
        Sqrt(x) => Sqrt(Box::new(applique_trig_speciale(x, preuve))),

        // --- feuilles ---
        Rat(_) | Pi | E | Indefini | Var(_) => expr.clone(),
    };

    // Un seul simplify à la fin.
    out.simplify()
}
