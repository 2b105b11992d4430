// src/noyau/normalisation.rs
//
// Réécriture textuelle avant tokenisation (ordre significatif) :
// 1. ^        -> **
// 2. (g)%     -> ((g)/100)
// 3. n%       -> (n/100)
// 4. (g)!     -> factorial(g), puis n! -> factorial(n)
// 5. × ÷      -> * /
//
// Pas de look-behind dans `regex` : le caractère qui précède est capturé
// puis recopié tel quel.

use log::error;
use regex::Regex;
use std::sync::OnceLock;

struct Regles {
    pourcent_groupe: Regex,
    pourcent_nombre: Regex,
    factorielle_groupe: Regex,
    factorielle_entier: Regex,
}

/// Motif constant : un échec est un bug, journalisé une fois à l’initialisation.
pub(crate) fn compiler(motif: &str) -> Option<Regex> {
    Regex::new(motif)
        .map_err(|e| error!("motif {motif:?} invalide : {e}"))
        .ok()
}

fn regles() -> Option<&'static Regles> {
    static REGLES: OnceLock<Option<Regles>> = OnceLock::new();
    REGLES
        .get_or_init(|| {
            Some(Regles {
                pourcent_groupe: compiler(r"(^|[^A-Za-z0-9_])\(([^()]*)\)%")?,
                pourcent_nombre: compiler(r"(\d+(?:\.\d+)?)%")?,
                factorielle_groupe: compiler(r"(^|[^A-Za-z0-9_])\(([^()]*)\)!")?,
                factorielle_entier: compiler(r"(^|[^\d.])(\d+)!")?,
            })
        })
        .as_ref()
}

/// Applique les règles de réécriture. Les cas non reconnus (groupe imbriqué,
/// `!` après un décimal…) restent tels quels et échoueront à la tokenisation.
pub fn normaliser(texte: &str) -> String {
    let s = texte.replace('^', "**");

    let Some(r) = regles() else {
        error!("règles %/! indisponibles : {texte:?} seulement partiellement normalisé");
        return s.replace('×', "*").replace('÷', "/");
    };

    let s = r.pourcent_groupe.replace_all(&s, "${1}((${2})/100)");
    let s = r.pourcent_nombre.replace_all(&s, "(${1}/100)");
    let s = r.factorielle_groupe.replace_all(&s, "${1}factorial(${2})");
    let s = r.factorielle_entier.replace_all(&s, "${1}factorial(${2})");

    s.replace('×', "*").replace('÷', "/")
}
