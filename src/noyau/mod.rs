//! Noyau de calcul exact
//!
//! Organisation interne :
//! - normalisation.rs : règles de texte (^, %, !, × ÷)
//! - jetons.rs        : tokenisation (décimaux exacts, π, √)
//! - symboles.rs      : table des noms selon le mode d’angle
//! - rpn.rs           : shunting-yard + construction Expr
//! - expr.rs          : AST exact + simplify + coeff*π
//! - trig.rs          : angles spéciaux + indéfini
//! - format.rs        : affichage exact (√2/2, π/2…)
//! - lecture.rs       : approximation décimale à précision fixée
//! - eval.rs          : pipeline complet + démarche
//! - session.rs       : ans, mémoire, historique
//! - historique.rs    : journal borné + export CSV
//! - trace.rs         : requêtes de tracé

pub mod erreur;
pub mod eval;
pub mod expr;
pub mod format;
pub mod historique;
pub mod jetons;
pub mod lecture;
pub mod normalisation;
pub mod rpn;
pub mod session;
pub mod symboles;
pub mod trace;
pub mod trig;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_fuzz_safe;

pub use erreur::ErreurCalcul;
pub use eval::{evaluer, Demarche, Resultat};
pub use session::Session;
pub use symboles::ModeAngle;
pub use trace::RequeteTrace;
