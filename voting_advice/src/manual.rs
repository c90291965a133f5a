/*!

This is the long-form manual for `voting_advice` and `kalkulacka`.

## Datasets

Three reference datasets are needed, all in JSON. A fourth one (issues) is
optional and is only used to check the other ones.

### `parties.json`

```json
[
  { "id": "ano", "name": "ANO 2011", "shortName": "ANO", "category": "main",
    "pollPercentage": 30.5, "pros": [], "cons": [] }
]
```

The `category` is either `main` or `secondary`. Main parties are always listed
before secondary parties in the results.

### `theses.json`

```json
[
  { "id": "t1", "issueId": "economy", "text": "Taxes should be lower.",
    "scaleMin": -2, "scaleMax": 2, "order": 1, "isActive": true }
]
```

Theses with `isActive: false` are dropped by `kalkulacka` unless
`--include-inactive` is passed.

### `positions.json`

```json
[
  { "partyId": "ano", "thesisId": "t1", "value": 1, "confidence": 0.8,
    "justification": "...",
    "details": { "arguments": ["..."], "quotes": [{ "text": "..." }],
                 "relatedVotes": [{ "title": "...", "vote": "for" }] },
    "source": { "url": "https://...", "date": "2025-05-01", "type": "program" },
    "lastUpdated": "2025-06-10T08:00:00Z" }
]
```

`value` goes from -2 (strongly against) to 2 (strongly for), `confidence` from
0 to 1. A party should have at most one position per thesis. If there are
several, the first one is used and `kalkulacka` reports a warning.

## Answers

The answers of a user are either a JSON array:

```json
[ { "thesisId": "t1", "value": 2, "weight": 3 },
  { "thesisId": "t2", "value": 0, "weight": 0 } ]
```

or a CSV file with a header row:

```text
thesisId,value,weight
t1,2,3
t2,0,0
t3,-1,
```

The weight goes from 1 (not important) to 3 (very important). A weight of 0
skips the thesis: it counts neither for nor against any party. An empty weight
in a CSV file means 1.

## Scores

For every thesis answered by the user and on which the party has a position,
the agreement is `(4 - |user - party|) / 4`, multiplied by the weight. The
agreement percentage of a party is the sum of these contributions over the sum
of the weights. The coverage is the share of the answered theses on which the
party has a position at all.

Red-line theses remove 20 points from the agreement of every party whose
position differs by more than 2 from the answer of the user, down to 0.

## Engagement

The engagement of a party on an issue blends four components:

| Component  | Weight | Meaning                                                        |
|------------|--------|----------------------------------------------------------------|
| coverage   | 0.45   | share of the theses of the issue with a position               |
| depth      | 0.25   | length of the justifications and amount of evidence            |
| confidence | 0.20   | average confidence of the positions                            |
| recency    | 0.10   | age of the most recent position, from 1.0 (3 months) to 0.3    |

Positions with no date get a recency of 0.4.

## Configuration

```json
{
  "outputSettings": { "title": "Volby 2025", "electionDate": "2025-10-03" },
  "dataSources": { "parties": "parties.json", "theses": "theses.json",
                   "positions": "positions.json", "issues": "issues.json" },
  "answerSource": { "provider": "csv", "filePath": "answers.csv" },
  "rules": { "redLineTheses": ["t3"], "includeInactiveTheses": false }
}
```

All the paths are relative to the configuration file.

*/
