/*!

This is the long-form manual for `survey_maps` and `surveymaps`.

## Variables

Every variable of the survey table has a kind, declared once in the data
dictionary:

| kind                    | aggregate                 | tooltip       | display          |
|-------------------------|---------------------------|---------------|------------------|
| `categorical_ordered`   | mean of the category code | `Mean`        | `1.4 (medium)`   |
| `categorical_unordered` | most common category      | `Most Common` | `bike`           |
| `boolean`               | share of `true`           | `Share`       | `42%`            |
| `numeric`               | mean                      | `Mean`        | `3.7`            |

The code of a category is its position in the declared list of categories,
starting at 0. Missing values do not enter the aggregates, but they are
counted in the number of observations of the group.

Numeric variables whose name starts with `p_` are probabilities expressed in
percent. Their mean is displayed as a rounded percentage (`37%`).

A variable named `<name>_binned` reads the values of the variable `<name>`.

## Palettes

The following palettes are available, each with 1 to 12 colors:
* `categorical` the first colors of a list of 12 distinct colors.
* `ordered` (or `blue-yellow`) a diverging palette going from blue to red
  through yellow, designed separately for every size.
* `blue`, `red`, `yellow`, `green`, `orange`, `purple` monochrome ramps.

The smaller monochrome palettes are obtained by removing colors from the
12-color ramp, always in the same order. A palette with fewer colors is
therefore always contained in a palette with more colors.

## Colors

* unordered categories: each category keeps the color of its position in the
  `categorical` palette, for all the regions.
* ordered categories: the region takes the color of the category closest to
  its mean code, in the `ordered` palette.
* booleans and numbers: the range between the 25% and the 75% quantiles of
  all the responses (extended to contain all the region aggregates) is split
  into 12 bins of equal width. Each region takes the color of its bin in the
  monochrome ramp of the variable (`blue` unless another hue is configured).

## Map properties

For every variable and every region that has responses, the following
properties are added to the region in the GeoJSON document:

* `label_<id>` the question asked
* `value_<id>` the displayed value
* `color_<id>` the hex code of the color
* `nobs_<id>` the number of responses in the region

The identifier `<id>` is derived from the nice name of the variable: German
umlauts are transliterated (`ü` becomes `ue`) and spaces and punctuation are
replaced by underscores.

Regions without responses receive no property. Responses from a group that has
no region in the boundary file are not shown on the map.

*/
