//! Built-in reference commit scenarios.

/// A replayable commit scenario: a base tree, a simulated commit, and
/// ground-truth expectations for the post-commit analysis.
pub struct Scenario {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    /// Files present before the commit.
    pub base_files: &'static [(&'static str, &'static str)],
    /// Files written (created or overwritten) by the commit.
    pub commit_files: &'static [(&'static str, &'static str)],
    /// Ground truth after the commit.
    pub expected_satd: usize,
    pub expected_chains: usize,
}

/// All reference scenarios, in id order.
pub fn builtin_scenarios() -> &'static [Scenario] {
    SCENARIOS
}

/// Look up a scenario by id.
pub fn scenario_by_id(id: u32) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.id == id)
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        id: 1,
        name: "linear-call-chain",
        description: "A commit admits debt on a caller and its callee, forming one chain",
        base_files: &[(
            "tasks.py",
            "def schedule():\n    return dispatch()\n\ndef dispatch():\n    return 1\n",
        )],
        commit_files: &[(
            "tasks.py",
            "# TODO scheduling ignores priorities\ndef schedule():\n    return dispatch()\n\n# FIXME dispatch drops events under load\ndef dispatch():\n    return 1\n",
        )],
        expected_satd: 2,
        expected_chains: 1,
    },
    Scenario {
        id: 2,
        name: "cross-module-import",
        description: "Debt on both sides of an import is linked by the module analyzer",
        base_files: &[
            (
                "main.py",
                "import util\n\ndef run():\n    return util.helper()\n",
            ),
            ("util.py", "def helper():\n    return 'ok'\n"),
        ],
        commit_files: &[
            (
                "main.py",
                "import util\n\n# TODO handle failures from util\ndef run():\n    return util.helper()\n",
            ),
            (
                "util.py",
                "# HACK helper hardcoded to the dev value\ndef helper():\n    return 'dev'\n",
            ),
        ],
        expected_satd: 2,
        expected_chains: 1,
    },
    Scenario {
        id: 3,
        name: "cyclic-calls",
        description: "A call cycle between three debt sites stays finite and forms one chain",
        base_files: &[(
            "loop.py",
            "def alpha():\n    return beta()\n\ndef beta():\n    return gamma()\n\ndef gamma():\n    return alpha()\n",
        )],
        commit_files: &[(
            "loop.py",
            "# TODO alpha retries forever\ndef alpha():\n    return beta()\n\n# TODO beta swallows errors\ndef beta():\n    return gamma()\n\n# TODO gamma recurses into alpha\ndef gamma():\n    return alpha()\n",
        )],
        expected_satd: 3,
        expected_chains: 1,
    },
    Scenario {
        id: 4,
        name: "clean-commit",
        description: "A commit without debt markers leaves the debt set unchanged",
        base_files: &[(
            "store.py",
            "# TODO persist to disk instead of memory\nstate = {}\n",
        )],
        commit_files: &[(
            "metrics.py",
            "def count(events):\n    return len(events)\n",
        )],
        expected_satd: 1,
        expected_chains: 0,
    },
    Scenario {
        id: 5,
        name: "implicit-only",
        description: "An implicit phrasing clears the threshold; plain comments never become candidates",
        base_files: &[("config.py", "retries = 3\n")],
        commit_files: &[(
            "config.py",
            "# this block is a temporary workaround for the migration\nretries = 3\n# plain explanation of the retry policy\nbackoff = 2\n",
        )],
        expected_satd: 1,
        expected_chains: 0,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_and_ordered() {
        let ids: Vec<u32> = builtin_scenarios().iter().map(|s| s.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(scenario_by_id(1).unwrap().name, "linear-call-chain");
        assert!(scenario_by_id(99).is_none());
    }

    #[test]
    fn test_commit_always_writes_something() {
        for scenario in builtin_scenarios() {
            assert!(
                !scenario.commit_files.is_empty(),
                "{} has an empty commit",
                scenario.name
            );
        }
    }
}
