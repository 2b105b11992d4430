//! Tests scientifiques (campagne) : propriétés du pipeline + session + limites contrôlées.
//!
//! But : trouver les limites sans faire chauffer la machine.
//! - budget temps global
//! - tailles bornées (profondeur, longueur)
//! - précision limitée pour la lecture décimale
//!
//! Les identités trig sont vérifiées sur la lecture décimale : deux formes
//! exactes égales peuvent s’écrire différemment.

use std::time::{Duration, Instant};

use super::erreur::ErreurCalcul;
use super::eval::{evaluer, Resultat};
use super::session::Session;
use super::symboles::ModeAngle;
use super::trace::RequeteTrace;

fn res(expr: &str, mode: ModeAngle, chiffres: usize) -> Resultat {
    evaluer(expr, mode, chiffres).0
}

fn dec(expr: &str) -> String {
    match res(expr, ModeAngle::Radians, 30) {
        Resultat::Numerique { approx, .. } => approx.to_string(),
        autre => panic!("expr={expr:?} : attendu Numerique, obtenu {autre:?}"),
    }
}

fn dec_deg(expr: &str) -> String {
    match res(expr, ModeAngle::Degres, 30) {
        Resultat::Numerique { approx, .. } => approx.to_string(),
        autre => panic!("expr={expr:?} : attendu Numerique, obtenu {autre:?}"),
    }
}

fn assert_indefini(expr: &str) {
    match res(expr, ModeAngle::Radians, 30) {
        Resultat::Erreur(ErreurCalcul::Indefini(_)) => {}
        autre => panic!("expr={expr:?} : attendu indéfini, obtenu {autre:?}"),
    }
}

fn assert_exact_eq(expr: &str, attendu: &str) {
    let exact = res(expr, ModeAngle::Radians, 30).exact();
    assert_eq!(exact.as_deref(), Some(attendu), "expr={expr:?}");
}

fn oppose_txt(s: &str) -> String {
    match s.strip_prefix('-') {
        Some(r) => r.to_string(),
        None if s == "0" => s.to_string(),
        None => format!("-{s}"),
    }
}

/// Budget global anti-gel.
fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Réécritures de texte ------------------------ */

#[test]
fn sci_chapeau_equivaut_a_double_etoile() {
    for (a, b) in [
        ("2^3", "2**3"),
        ("(1+x)^2", "(1+x)**2"),
        ("2^3^2", "2**3**2"),
        ("-2^2", "-2**2"),
        ("e^(1/2)", "e**(1/2)"),
    ] {
        assert_eq!(
            res(a, ModeAngle::Radians, 20),
            res(b, ModeAngle::Radians, 20),
            "{a} vs {b}"
        );
    }
    assert_eq!(dec("2^3"), "8");
    // associativité à droite
    assert_eq!(dec("2^3^2"), "512");
}

#[test]
fn sci_factorielle_et_pourcent() {
    assert_eq!(dec("5!"), "120");
    assert_eq!(dec("(2+1)!"), "6");
    assert_eq!(dec("0!"), "1");
    assert_eq!(dec("50%"), "0.5");
    assert_eq!(dec("(10+10)%"), "0.2");
    assert_eq!(dec("12.5%*80"), "10");
}

/* ------------------------ Mode d’angle ------------------------ */

#[test]
fn sci_mode_angle_selectionne_la_table() {
    assert_eq!(dec_deg("sin(30)"), "0.5");
    assert_eq!(dec("sin(pi/6)"), "0.5");
    assert_ne!(dec("sin(30)"), "0.5");
    assert_eq!(dec_deg("cos(60)"), "0.5");
    assert_eq!(dec_deg("tan(45)"), "1");

    // fonctions non trig : identiques dans les deux modes
    for s in ["ln(2)", "sqrt(2)", "log10(7)", "exp(1)", "gamma(5/2)"] {
        assert_eq!(dec(s), dec_deg(s), "{s}");
    }
}

#[test]
fn sci_log10_n_est_pas_ln() {
    assert_eq!(dec("log10(100)"), "2");
    assert_ne!(dec("log10(100)"), dec("log(100)"));
    // log(100) = log10(100) · ln(10)
    assert_eq!(dec("log(100)"), dec("log10(100)*ln(10)"));
    assert_eq!(dec("ln(100)"), dec("log(100)"));
}

#[test]
fn sci_log_sur_log10_vaut_ln10() {
    let ln10 = match res("ln(10)", ModeAngle::Radians, 25) {
        Resultat::Numerique { approx, .. } => approx.to_string(),
        autre => panic!("ln(10) : {autre:?}"),
    };
    for n in ["2", "7", "1/3", "1000", "e"] {
        let r = res(&format!("log({n})/log10({n})"), ModeAngle::Radians, 25);
        assert_eq!(r.texte(), ln10, "log({n})/log10({n})");
    }
}

/* ------------------------ Invariants trig (angles spéciaux) ------------------------ */

#[test]
fn sci_indefinis_tan() {
    assert_indefini("tan(pi/2)");
    assert_indefini("tan(3*pi/2)");
    assert_indefini("tan(-pi/2)");
    assert!(matches!(
        res("tan(90)", ModeAngle::Degres, 20),
        Resultat::Erreur(ErreurCalcul::Indefini(_))
    ));
}

#[test]
fn sci_identites_symetrie() {
    // sin(-x) = -sin(x)
    assert_eq!(dec("sin(-pi/4)"), oppose_txt(&dec("sin(pi/4)")));
    assert_exact_eq("sin(pi/4)", "√2/2");

    // cos(-x) = cos(x)
    assert_eq!(dec("cos(-pi/3)"), dec("cos(pi/3)"));
    assert_exact_eq("cos(pi/3)", "1/2");

    // tan(-x) = -tan(x) (hors indéfini)
    assert_eq!(dec("tan(-pi/6)"), oppose_txt(&dec("tan(pi/6)")));
    assert_exact_eq("tan(pi/6)", "√3/3");

    // hors table : même chose par la lecture numérique
    assert_eq!(dec("sin(-1)"), oppose_txt(&dec("sin(1)")));
}

#[test]
fn sci_periodicite_angles() {
    assert_eq!(dec("sin(9*pi/4)"), dec("sin(pi/4)"));
    assert_eq!(dec("cos(7*pi/3)"), dec("cos(pi/3)"));
    assert_eq!(dec("tan(7*pi/6)"), dec("tan(pi/6)"));
    assert_eq!(dec_deg("sin(390)"), "0.5");
}

#[test]
fn sci_reciproques_en_degres() {
    assert_eq!(res("asin(1/2)", ModeAngle::Degres, 20).exact().as_deref(), Some("30"));
    assert_eq!(dec_deg("acos(1/2)"), "60");
    assert_eq!(dec_deg("atan(1)"), "45");
    assert_exact_eq("acos(-1)", "π");
}

#[test]
fn sci_propagation_indefini() {
    assert_indefini("1 + tan(pi/2)");
    assert_indefini("tan(pi/2) + 1");
    assert_indefini("2 * tan(pi/2)");
    assert_indefini("tan(pi/2) / 3");
}

/* ------------------------ Cohérence algébrique (zéro) ------------------------ */

#[test]
fn sci_zero_algebrique() {
    assert_exact_eq("(1/2 + 1/3) - 5/6", "0");
    assert_exact_eq("(2/3 * 3/4) - 1/2", "0");
    assert_exact_eq("sqrt(2)*sqrt(2) - 2", "0");
    assert_exact_eq("1/sqrt(3)", "√3/3");
    assert_exact_eq("sqrt(3)/3", "√3/3");
    assert_eq!(dec("0.1+0.2-0.3"), "0");
}

#[test]
fn sci_erreur_jamais_effacee() {
    // un facteur nul, une différence a−a ou une variable libre ne cachent
    // pas une division par zéro ni un hors-domaine
    for s in ["0*(1/0)", "(1/0)*0", "(1/0)-(1/0)", "1/0+x", "x*(1/(2-2))"] {
        assert_eq!(
            res(s, ModeAngle::Radians, 20),
            Resultat::Erreur(ErreurCalcul::DivisionParZero),
            "{s}"
        );
    }
    for s in [
        "0*ln(-1)",
        "0*factorial(-1)",
        "ln(-1)-ln(-1)",
        "sqrt(-4)*x",
        "x^2+asin(2)",
        "sqrt(-1)*sqrt(-1)",
    ] {
        assert!(
            matches!(res(s, ModeAngle::Radians, 20), Resultat::Erreur(ErreurCalcul::Domaine(_))),
            "{s}"
        );
    }

    // ni ans ni historique ne bougent
    let (_, s) = Session::new(20, 50).evaluer("x+1", ModeAngle::Radians);
    let avant = (s.reponse().clone(), s.historique().clone());
    let (r, s) = s.evaluer("1/0+x", ModeAngle::Radians);
    assert!(!r.est_tracable());
    assert_eq!((s.reponse().clone(), s.historique().clone()), avant);

    // les effacements légitimes restent
    assert_exact_eq("x-x", "0");
    assert_exact_eq("0*ln(2)", "0");
}

/* ------------------------ Lecture numérique ------------------------ */

#[test]
fn sci_lecture_constantes() {
    assert_eq!(dec("pi"), "3.14159265358979323846264338328");
    assert_eq!(dec("e"), "2.718281828459045235360287471353");
    assert_eq!(dec("ln(2)"), "0.693147180559945309417232121458");
    // Γ(1/2)² = π
    assert_eq!(dec("gamma(1/2)^2"), dec("pi"));
    assert_eq!(dec("exp(ln(7))"), "7");
}

#[test]
fn sci_domaines() {
    for s in ["ln(-1)", "sqrt(-4)", "factorial(-1)", "asin(2)", "acosh(0)", "log10(0)"] {
        assert!(
            matches!(res(s, ModeAngle::Radians, 20), Resultat::Erreur(ErreurCalcul::Domaine(_))),
            "{s}"
        );
    }
    assert_eq!(
        res("1/(2-2)", ModeAngle::Radians, 20),
        Resultat::Erreur(ErreurCalcul::DivisionParZero)
    );
}

/* ------------------------ Classement / tracé ------------------------ */

#[test]
fn sci_classement_symbolique() {
    match res("x^2+1", ModeAngle::Radians, 20) {
        Resultat::Symbolique { variables, .. } => assert_eq!(variables, vec!["x".to_string()]),
        autre => panic!("attendu Symbolique, obtenu {autre:?}"),
    }
    assert!(matches!(
        res("3^2+1", ModeAngle::Radians, 20),
        Resultat::Numerique { .. }
    ));
    // x absorbé par un facteur nul : plus de variable libre
    assert!(matches!(
        res("sin(x)*0+1", ModeAngle::Radians, 20),
        Resultat::Numerique { .. }
    ));
}

#[test]
fn sci_trace_domaine_refuse_sans_echange() {
    let r = res("sin(x)", ModeAngle::Radians, 20);
    assert!(r.est_tracable());
    assert_eq!(
        RequeteTrace::nouvelle(&r, 3.0, -3.0),
        Err(ErreurCalcul::DomaineTrace { min: 3.0, max: -3.0 })
    );
    let ok = RequeteTrace::nouvelle(&r, -3.0, 3.0).unwrap();
    assert_eq!(ok.domaine(), (-3.0, 3.0));
    assert_eq!(ok.echantillonner(400).len(), 400);
}

/* ------------------------ Session ------------------------ */

#[test]
fn sci_historique_et_eviction() {
    let mut s = Session::new(20, 3);
    for (i, expr) in ["1+1", "2*3", "2^10", "5!"].iter().enumerate() {
        let (r, suite) = s.evaluer(expr, ModeAngle::Radians);
        s = suite;
        let e = s.historique().plus_recente().unwrap();
        assert_eq!(e.expression, *expr);
        assert_eq!(e.resultat, r.texte());
        assert_eq!(s.historique().len(), (i + 1).min(3));
    }
    let exprs: Vec<&str> = s.historique().iter().map(|e| e.expression.as_str()).collect();
    assert_eq!(exprs, vec!["5!", "2^10", "2*3"]);
}

#[test]
fn sci_echec_ne_touche_a_rien() {
    let (_, mut s) = Session::new(20, 50).evaluer("7/2", ModeAngle::Radians);
    s.memoire_plus("3", ModeAngle::Radians);
    let avant = (s.reponse().clone(), s.memoire().clone(), s.historique().clone());

    for faux in ["", "1/0", "ln(-1)", "sinn(1)", "2+*3", "tan(pi/2)", "(1+2"] {
        let (r, suite) = s.evaluer(faux, ModeAngle::Radians);
        assert!(r.est_erreur(), "{faux:?}");
        s = suite;
    }
    assert_eq!(
        (s.reponse().clone(), s.memoire().clone(), s.historique().clone()),
        avant
    );
    let (r, _) = s.evaluer("ans*2", ModeAngle::Radians);
    assert_eq!(r.texte(), "7");
}

#[test]
fn sci_idempotence_a_session_egale() {
    let (_, s) = Session::new(20, 50).evaluer("sin(30)", ModeAngle::Degres);
    for expr in ["ans+1", "ans*x", "sqrt(ans)", "tan(ans)"] {
        let (a, _) = s.clone().evaluer(expr, ModeAngle::Degres);
        let (b, _) = s.clone().evaluer(expr, ModeAngle::Degres);
        assert_eq!(a, b, "{expr}");
    }
}

#[test]
fn sci_ans_symbolique_suit_le_mode() {
    let valeurs = |r: &Resultat| -> Vec<f64> {
        RequeteTrace::nouvelle(r, -180.0, 180.0)
            .unwrap()
            .echantillonner(9)
            .iter()
            .map(|p| p[1])
            .collect()
    };

    let (r0, s) = Session::new(20, 50).evaluer("sin(x)+acos(x/360)", ModeAngle::Degres);
    let (r1, s) = s.evaluer("ans", ModeAngle::Degres);
    let (r2, _) = s.evaluer("ans", ModeAngle::Radians);
    for ((a, b), c) in valeurs(&r0).iter().zip(valeurs(&r1)).zip(valeurs(&r2)) {
        assert!((a - b).abs() < 1e-12 && (a - c).abs() < 1e-12, "{a} {b} {c}");
    }
    // 2·sin(90°) = 2 : une seule conversion en degrés
    let (r, _) = Session::new(20, 50)
        .evaluer("sin(x)", ModeAngle::Degres)
        .1
        .evaluer("ans*2", ModeAngle::Degres);
    let y = RequeteTrace::nouvelle(&r, 89.0, 91.0).unwrap().echantillonner(3)[1][1];
    assert!((y - 2.0).abs() < 1e-12, "{y}");
}

/* ------------------------ Stress contrôlé (sans brûler) ------------------------ */

#[test]
fn sci_stress_profondeur_sqrt_safe() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    // sqrt / carré alternés : reste un carré parfait à chaque étape
    let mut expr = "4".to_string();
    for k in 0..60 {
        expr = if k % 2 == 0 {
            format!("sqrt({expr})")
        } else {
            format!("({expr})^2")
        };
    }

    assert_eq!(dec(&expr), "4");
    budget(t0, max);
}

#[test]
fn sci_stress_taille_somme_safe() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    let expr = vec!["1/2"; 80].join(" + ");
    assert_eq!(dec(&expr), "40");
    budget(t0, max);
}

#[test]
fn sci_stress_bigint_safe() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    // (10^100 - 1)/7 + 1/7 = 10^100 / 7
    let big = "9".repeat(100);
    let r = res(&format!("{big}/7 + 1/7"), ModeAngle::Radians, 20);
    assert_eq!(r, res("10^100/7", ModeAngle::Radians, 20));
    budget(t0, max);
}

#[test]
fn sci_garde_fous_sans_gel() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    for s in ["exp(100000)", "10^(10^10)", "factorial(100000)", "gamma(10^6)"] {
        assert!(
            matches!(
                res(s, ModeAngle::Radians, 20),
                Resultat::Erreur(ErreurCalcul::Depassement(_))
            ),
            "{s}"
        );
        budget(t0, max);
    }
}
