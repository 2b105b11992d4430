// src/noyau/session.rs
//
// État de session explicite : registre `ans`, mémoire, historique.
// - evaluer() consomme la session et la rend : en cas de succès `ans` et
//   l’historique sont mis à jour ensemble, en cas d’erreur rien ne bouge.
// - M+ / M- évaluent le texte affiché (pas `ans`) ; erreur ou symbolique :
//   mémoire inchangée, avertissement renvoyé.

use log::{debug, error, warn};
use num_rational::BigRational;
use num_traits::Zero;
use regex::Regex;
use std::sync::OnceLock;

use super::eval::{evaluer_normalise, Demarche, Resultat};
use super::expr::Expr;
use super::historique::Historique;
use super::lecture::Approx;
use super::normalisation::{compiler, normaliser};
use super::symboles::ModeAngle;

/// Registre `ans` : dernier résultat réussi.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Reponse {
    #[default]
    Zero,
    Numerique { exact: Expr, approx: Approx },
    Symbolique(Expr),
}

impl Reponse {
    fn depuis(resultat: &Resultat) -> Option<Self> {
        match resultat {
            Resultat::Numerique { exact, approx } => Some(Reponse::Numerique {
                exact: exact.clone(),
                approx: approx.clone(),
            }),
            Resultat::Symbolique { expr, .. } => Some(Reponse::Symbolique(expr.clone())),
            Resultat::Erreur(_) => None,
        }
    }

    /// Texte substitué à `ans` pour une analyse dans `mode`, avant l’ajout
    /// des parenthèses. Numérique avec trig : valeur décimale, le sens ne
    /// dépend plus du mode. Symbolique : forme source compensée pour `mode`.
    pub fn rendu(&self, mode: ModeAngle) -> String {
        match self {
            Reponse::Zero => "0".to_string(),
            Reponse::Numerique { exact, approx } => {
                if exact.depend_du_mode() {
                    approx.to_string()
                } else {
                    exact.to_string()
                }
            }
            Reponse::Symbolique(expr) => expr.forme_source(mode),
        }
    }
}

fn regex_ans() -> Option<&'static Regex> {
    static ANS: OnceLock<Option<Regex>> = OnceLock::new();
    ANS.get_or_init(|| compiler(r"\bans\b")).as_ref()
}

/// Remplace chaque mot `ans` (texte déjà normalisé) par `(<rendu>)`.
pub fn substituer_reponse(texte: &str, reponse: &Reponse, mode: ModeAngle) -> String {
    let Some(re) = regex_ans() else {
        error!("substitution de `ans` indisponible : {texte:?} laissé tel quel");
        return texte.to_string();
    };
    let rendu = format!("({})", reponse.rendu(mode));
    re.replace_all(texte, regex::NoExpand(&rendu)).into_owned()
}

#[derive(Clone, Debug)]
pub struct Session {
    reponse: Reponse,
    memoire: BigRational,
    historique: Historique,
    chiffres: usize,
}

impl Session {
    pub fn new(chiffres: usize, capacite_historique: usize) -> Self {
        Session {
            reponse: Reponse::default(),
            memoire: BigRational::zero(),
            historique: Historique::new(capacite_historique),
            chiffres,
        }
    }

    pub fn reponse(&self) -> &Reponse {
        &self.reponse
    }

    pub fn historique(&self) -> &Historique {
        &self.historique
    }

    pub fn memoire(&self) -> &BigRational {
        &self.memoire
    }

    pub fn chiffres(&self) -> usize {
        self.chiffres
    }

    /// Précision des évaluations suivantes (ne touche ni `ans` ni la mémoire).
    pub fn avec_chiffres(mut self, chiffres: usize) -> Self {
        self.chiffres = chiffres;
        self
    }

    /* ------------------------ Évaluation ------------------------ */

    pub fn evaluer(self, texte: &str, mode: ModeAngle) -> (Resultat, Session) {
        let (resultat, _, session) = self.evaluer_avec_demarche(texte, mode);
        (resultat, session)
    }

    pub fn evaluer_avec_demarche(
        mut self,
        texte: &str,
        mode: ModeAngle,
    ) -> (Resultat, Demarche, Session) {
        let (resultat, demarche) = self.calculer(texte, mode);

        if let Some(reponse) = Reponse::depuis(&resultat) {
            self.historique.ajouter(texte.trim(), resultat.texte());
            self.reponse = reponse;
        }

        (resultat, demarche, self)
    }

    /// normaliser -> substituer `ans` -> pipeline. Sans effet sur la session.
    fn calculer(&self, texte: &str, mode: ModeAngle) -> (Resultat, Demarche) {
        let normalise = normaliser(texte);
        let substitue = substituer_reponse(&normalise, &self.reponse, mode);
        if substitue != normalise {
            debug!("ans substitué : {normalise:?} -> {substitue:?}");
        }
        evaluer_normalise(&substitue, mode, self.chiffres)
    }

    /* ------------------------ Mémoire ------------------------ */

    /// M+ : ajoute la valeur du texte affiché. Renvoie un avertissement si impossible.
    pub fn memoire_plus(&mut self, texte: &str, mode: ModeAngle) -> Option<String> {
        self.accumuler(texte, mode, "M+", false)
    }

    /// M- : retranche la valeur du texte affiché.
    pub fn memoire_moins(&mut self, texte: &str, mode: ModeAngle) -> Option<String> {
        self.accumuler(texte, mode, "M-", true)
    }

    fn accumuler(
        &mut self,
        texte: &str,
        mode: ModeAngle,
        touche: &str,
        retrancher: bool,
    ) -> Option<String> {
        let (resultat, _) = self.calculer(texte, mode);
        match resultat {
            Resultat::Numerique { approx, .. } => {
                let v = approx.vers_rationnel();
                if retrancher {
                    self.memoire -= v;
                } else {
                    self.memoire += v;
                }
                None
            }
            Resultat::Symbolique { .. } => {
                let msg = format!("{touche} impossible : expression non numérique");
                warn!("{msg}");
                Some(msg)
            }
            Resultat::Erreur(e) => {
                let msg = format!("{touche} impossible : {e}");
                warn!("{msg}");
                Some(msg)
            }
        }
    }

    /// Efface l’historique ; `ans` et la mémoire restent.
    pub fn vider_historique(&mut self) {
        self.historique.vider();
    }

    /// MR : texte décimal de la mémoire.
    pub fn rappel_memoire(&self) -> String {
        Approx::depuis_rationnel(&self.memoire, self.chiffres).to_string()
    }

    /// MC
    pub fn effacer_memoire(&mut self) {
        self.memoire = BigRational::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::erreur::ErreurCalcul;

    fn session() -> Session {
        Session::new(20, 50)
    }

    #[test]
    fn ans_par_defaut_zero() {
        let (r, _) = session().evaluer("ans+1", ModeAngle::Radians);
        assert_eq!(r.texte(), "1");
    }

    #[test]
    fn ans_exact_reutilise() {
        let (_, s) = session().evaluer("1/3", ModeAngle::Radians);
        let (r, _) = s.evaluer("ans*3", ModeAngle::Radians);
        // exact : pas d’erreur d’arrondi
        assert_eq!(r.texte(), "1");
    }

    #[test]
    fn ans_trig_fige_en_decimal() {
        // sin(30) en degrés = 1/2 exact, rendu source "(1/2)" : sans trig
        let (_, s) = session().evaluer("sin(30)", ModeAngle::Degres);
        assert_eq!(s.reponse().rendu(ModeAngle::Degres), "(1/2)");

        // sin(1) reste un appel trig : rendu décimal
        let (_, s) = session().evaluer("sin(1)", ModeAngle::Degres);
        assert!(s.reponse().rendu(ModeAngle::Degres).starts_with("0.0174524064"));
        let (r, _) = s.evaluer("ans", ModeAngle::Radians);
        assert!(r.texte().starts_with("0.0174524064"));
    }

    #[test]
    fn ans_symbolique_trig_garde_son_sens() {
        use crate::noyau::trace::RequeteTrace;

        let courbe = |r: &Resultat| -> Vec<f64> {
            RequeteTrace::nouvelle(r, -90.0, 90.0)
                .unwrap()
                .echantillonner(7)
                .iter()
                .map(|p| p[1])
                .collect()
        };

        for texte in ["sin(x)", "atan(x)+cos(2*x)"] {
            let (r0, s) = session().evaluer(texte, ModeAngle::Degres);
            // reprise dans le même mode : même courbe, pas de double conversion
            let (r1, s) = s.evaluer("ans", ModeAngle::Degres);
            for (a, b) in courbe(&r0).iter().zip(courbe(&r1)) {
                assert!((a - b).abs() < 1e-12, "{texte} : {a} vs {b}");
            }
            // reprise en radians : toujours la même fonction
            let (r2, _) = s.evaluer("ans", ModeAngle::Radians);
            for (a, b) in courbe(&r0).iter().zip(courbe(&r2)) {
                assert!((a - b).abs() < 1e-12, "{texte} : {a} vs {b}");
            }
        }
    }

    #[test]
    fn ans_symbolique() {
        let (_, s) = session().evaluer("x^2", ModeAngle::Radians);
        let (r, _) = s.evaluer("ans+1", ModeAngle::Radians);
        assert!(r.est_tracable());
        assert_eq!(r.texte(), "x^2+1");
    }

    #[test]
    fn substitution_mot_entier() {
        let r = Reponse::Zero;
        let rad = ModeAngle::Radians;
        assert!(regex_ans().is_some());
        assert_eq!(substituer_reponse("ans+ans", &r, rad), "(0)+(0)");
        assert_eq!(substituer_reponse("answer", &r, rad), "answer");
        assert_eq!(substituer_reponse("2*ans", &r, rad), "2*(0)");
    }

    #[test]
    fn echec_ne_change_rien() {
        let (_, s) = session().evaluer("2+2", ModeAngle::Radians);
        let mut s = s;
        assert!(s.memoire_plus("5", ModeAngle::Radians).is_none());
        let avant_ans = s.reponse().clone();
        let avant_hist = s.historique().clone();
        let avant_mem = s.memoire().clone();

        let (r, s) = s.evaluer("1/0", ModeAngle::Radians);
        assert_eq!(r, Resultat::Erreur(ErreurCalcul::DivisionParZero));
        assert_eq!(s.reponse(), &avant_ans);
        assert_eq!(s.historique(), &avant_hist);
        assert_eq!(s.memoire(), &avant_mem);
    }

    #[test]
    fn historique_suit_ans() {
        let (_, s) = session().evaluer("2+2", ModeAngle::Radians);
        let (_, s) = s.evaluer("x+1", ModeAngle::Radians);
        let e = s.historique().plus_recente().unwrap();
        assert_eq!(e.expression, "x+1");
        assert_eq!(e.resultat, "x+1");
        assert_eq!(s.historique().len(), 2);
    }

    #[test]
    fn memoire_arithmetique() {
        let mut s = session();
        assert!(s.memoire_plus("1/2", ModeAngle::Radians).is_none());
        assert!(s.memoire_plus("2^3", ModeAngle::Radians).is_none());
        assert!(s.memoire_moins("0.25", ModeAngle::Radians).is_none());
        assert_eq!(s.rappel_memoire(), "8.25");

        // symbolique / erreur : avertissement, mémoire inchangée
        assert!(s.memoire_plus("x+1", ModeAngle::Radians).is_some());
        assert!(s.memoire_moins("ln(-1)", ModeAngle::Radians).is_some());
        assert_eq!(s.rappel_memoire(), "8.25");

        s.effacer_memoire();
        assert_eq!(s.rappel_memoire(), "0");
    }

    #[test]
    fn memoire_independante_du_mode() {
        let mut s = session();
        s.memoire_plus("sin(30)", ModeAngle::Degres);
        assert_eq!(s.rappel_memoire(), "0.5");
    }
}
