// src/noyau/erreur.rs
//
// Taxonomie des erreurs du noyau.
// Toute erreur finit en `Resultat::Erreur` à la frontière du pipeline :
// aucune panique, aucun Err ne remonte jusqu’à l’UI.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErreurCalcul {
    #[error("Entrée vide")]
    EntreeVide,

    /// Jetons/parenthèses/suffixes `!` `%` non résolus.
    #[error("syntaxe : {0}")]
    Syntaxe(String),

    #[error("{}", message_inconnu(.nom, .suggestion.as_deref()))]
    IdentifiantInconnu {
        nom: String,
        suggestion: Option<String>,
    },

    /// Opération hors domaine réel (ln(-1), √-4, factorielle négative…).
    #[error("domaine : {0}")]
    Domaine(String),

    #[error("division par zéro")]
    DivisionParZero,

    /// Valeur exacte indéfinie (ex: tan(π/2)).
    #[error("indéfini : {0}")]
    Indefini(String),

    /// Garde-fou : calcul trop gros pour rester interactif.
    #[error("dépassement : {0}")]
    Depassement(String),

    #[error("résultat non traçable (aucune variable x)")]
    NonTracable,

    #[error("domaine de tracé invalide : max ({max}) doit être > min ({min})")]
    DomaineTrace { min: f64, max: f64 },
}

fn message_inconnu(nom: &str, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("identifiant inconnu : '{nom}' (vouliez-vous dire '{s}' ?)"),
        None => format!("identifiant inconnu : '{nom}'"),
    }
}
